//! 按交易哈希分组

use super::normalize::LedgerEvent;
use crate::types::EventKind;
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

/// 同一交易哈希下的事件组（保持抓取顺序）
#[derive(Debug, Clone)]
pub struct EventGroup {
    hash: String,
    events: Vec<LedgerEvent>,
}

impl EventGroup {
    pub fn new(hash: String, events: Vec<LedgerEvent>) -> Self {
        Self { hash, events }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// 锚点记录（原生交易），无论其位置
    pub fn anchor(&self) -> Option<&LedgerEvent> {
        self.events.iter().find(|e| e.kind == EventKind::Native)
    }

    /// 除锚点外的其余记录
    pub fn rows(&self) -> Vec<&LedgerEvent> {
        self.events
            .iter()
            .filter(|e| e.kind != EventKind::Native)
            .collect()
    }
}

/// 划分事件流：剔除出错事件，按哈希分组，组顺序为哈希首次出现的顺序
pub fn partition(events: &[LedgerEvent]) -> Vec<EventGroup> {
    let mut grouped: IndexMap<String, (Vec<LedgerEvent>, IndexSet<String>)> = IndexMap::new();

    for event in events.iter().filter(|e| !e.is_error) {
        let (rows, seen) = grouped
            .entry(event.hash.clone())
            .or_insert_with(|| (Vec::new(), IndexSet::new()));

        if !seen.insert(event.fingerprint()) {
            continue;
        }

        if event.kind == EventKind::Native && rows.iter().any(|e| e.kind == EventKind::Native) {
            warn!(hash = %event.hash, "同一哈希出现多条原生交易，仅保留第一条");
            continue;
        }
        rows.push(event.clone());
    }

    grouped
        .into_iter()
        .map(|(hash, (rows, _))| EventGroup::new(hash, rows))
        .collect()
}

/// 出错事件数量
pub fn error_count(events: &[LedgerEvent]) -> usize {
    events.iter().filter(|e| e.is_error).count()
}
