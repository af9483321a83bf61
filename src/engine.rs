//! 调查流程
//!
//! Normalize → Partition → Classify → Accumulate → Persist。
//! 每个阶段开始时发出通知；任一阶段失败即中止后续阶段，已持久化的数据不受影响。

use crate::classify::{ClassificationRunResult, Classifier};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::{error_count, partition, LedgerEvent, Normalizer, RawBatch};
use crate::graph::{build_linear, present, GraphBuilder, GraphPayload};
use crate::reference::{LabelTable, TagTable};
use crate::stats::{StatsDelta, StatsSummary};
use crate::storage::{CommitReport, GraphStore};
use crate::types::{Address, Fidelity};
use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::info;

/// 处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Normalize,
    Partition,
    Classify,
    Accumulate,
    Persist,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Normalize => "normalize",
            Phase::Partition => "partition",
            Phase::Classify => "classify",
            Phase::Accumulate => "accumulate",
            Phase::Persist => "persist",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次调查的输出
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationReport {
    pub graph: GraphPayload,
    /// 涉及中心地址的全部事件
    pub events: Vec<LedgerEvent>,
    /// 持久化后的统计汇总
    pub stats: StatsSummary,
    /// 本批次增量
    pub delta: StatsDelta,
    pub run: ClassificationRunResult,
    pub commit: CommitReport,
    /// 因已分类而跳过的交易数
    pub replayed: usize,
    pub duration_ms: u64,
}

type PhaseListener<'a> = Box<dyn FnMut(Phase) + 'a>;

/// 针对一个中心地址的调查
pub struct Investigation<'a> {
    config: &'a EngineConfig,
    store: &'a dyn GraphStore,
    labels: &'a LabelTable,
    central: Address,
    tags: TagTable,
    fidelity: Fidelity,
    listener: Option<PhaseListener<'a>>,
}

impl<'a> Investigation<'a> {
    pub fn new(
        config: &'a EngineConfig,
        store: &'a dyn GraphStore,
        labels: &'a LabelTable,
        central: Address,
    ) -> Self {
        let mut tags = TagTable::new();
        tags.seed_central(&central);
        Self {
            config,
            store,
            labels,
            central,
            tags,
            fidelity: config.fidelity,
            listener: None,
        }
    }

    /// 标记邻域中的路径地址
    pub fn with_path<I>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        for address in addresses {
            self.tags.add_path(&address);
        }
        self
    }

    pub fn with_fidelity(mut self, fidelity: Fidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    /// 阶段通知回调
    pub fn on_phase<F>(mut self, listener: F) -> Self
    where
        F: FnMut(Phase) + 'a,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn central(&self) -> &Address {
        &self.central
    }

    fn enter(&mut self, phase: Phase) {
        info!(phase = %phase, central = %self.central, "进入阶段");
        if let Some(listener) = self.listener.as_mut() {
            listener(phase);
        }
    }

    /// 运行完整流程
    pub fn run(&mut self, batch: &RawBatch) -> Result<InvestigationReport> {
        let start = Instant::now();
        let central = self.central.clone();

        self.enter(Phase::Normalize);
        let events = Normalizer::new(&self.config.chain, &self.config.native).normalize(batch)?;

        // 统计按事件指纹去重：已计入的事件不再累加
        let mut fingerprints: IndexSet<String> = IndexSet::new();
        let uncounted: Vec<LedgerEvent> = events
            .iter()
            .filter(|e| {
                let fingerprint = e.fingerprint();
                !self.store.is_counted(&fingerprint) && fingerprints.insert(fingerprint)
            })
            .cloned()
            .collect();

        // 已成功分类的交易整组跳过；缺锚点或未识别的组留待下次重试
        let mut replayed: IndexSet<&str> = IndexSet::new();
        let pending: Vec<LedgerEvent> = events
            .iter()
            .filter(|e| {
                if self.store.is_processed(&e.hash) {
                    replayed.insert(e.hash.as_str());
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        let replayed = replayed.len();
        info!(
            events = events.len(),
            uncounted = uncounted.len(),
            errors = error_count(&uncounted),
            pending = pending.len(),
            replayed,
            "规范化完成"
        );

        let mut tags = self.store.tags();
        tags.merge(&self.tags);
        let derived = tags.derive_from_events(&events, &central);

        self.enter(Phase::Partition);
        let groups = partition(&pending);
        info!(groups = groups.len(), derived_tags = derived, "分组完成");

        self.enter(Phase::Classify);
        let mut builder = GraphBuilder::new(self.store, &tags, self.labels, &central);
        let (run, hashes) = match self.fidelity {
            Fidelity::Detailed => {
                let run = Classifier::new(&central).classify_all(&groups, &mut builder);
                let hashes = run.classified_hashes.clone();
                (run, hashes)
            }
            Fidelity::Linear => {
                build_linear(&pending, &mut builder);
                let hashes: IndexSet<String> = pending.iter().map(|e| e.hash.clone()).collect();
                (ClassificationRunResult::default(), hashes.into_iter().collect())
            }
        };
        info!(
            classified = run.classified,
            unclassified = run.unclassified,
            incomplete = run.incomplete,
            "分类完成"
        );

        self.enter(Phase::Accumulate);
        let mut delta = builder.into_delta();
        delta.stats =
            StatsDelta::from_events(&uncounted).with_nodes(delta.stats.wallet, delta.stats.contract);
        delta.hashes = hashes;
        delta.fingerprints = fingerprints.into_iter().collect();
        delta.tags = tags;
        let stats_delta = delta.stats;
        info!(
            nodes = delta.nodes.len(),
            edges = delta.edges.len(),
            tot = stats_delta.tot,
            "增量已生成"
        );

        self.enter(Phase::Persist);
        let commit = self.store.commit(delta)?;
        info!(
            nodes_added = commit.nodes_added,
            edges_added = commit.edges_added,
            edges_merged = commit.edges_merged,
            "已提交"
        );

        let touching = events
            .into_iter()
            .filter(|e| e.touches(&central))
            .collect();

        Ok(InvestigationReport {
            graph: present(self.store),
            events: touching,
            stats: self.store.stats(),
            delta: stats_delta,
            run,
            commit,
            replayed,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
