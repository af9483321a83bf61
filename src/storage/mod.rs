//! 存储模块
//!
//! 三类持久化数据：节点（按 ID 唯一）、边（按复合键唯一）、统计汇总（单行）。
//! 另外记录两本账：已分类的交易哈希（决定是否重新分类）和已计入统计的事件指纹
//! （决定是否重新计数），以及参考标签。
//! 所有写入都经过 `commit`：节点只插入不覆盖，边与统计只做累加。

mod disk;
mod memory;

pub use disk::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::graph::{Edge, GraphDelta, LinkKey, Node};
use crate::reference::TagTable;
use crate::stats::StatsSummary;
use crate::types::Address;
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// 图存储接口
pub trait GraphStore: Send + Sync {
    fn contains_node(&self, id: &Address) -> bool;

    fn node(&self, id: &Address) -> Option<Node>;

    fn nodes(&self) -> Vec<Node>;

    fn edge(&self, key: &LinkKey) -> Option<Edge>;

    fn edges(&self) -> Vec<Edge>;

    fn stats(&self) -> StatsSummary;

    /// 累积的参考标签
    fn tags(&self) -> TagTable;

    /// 交易哈希是否已成功分类
    fn is_processed(&self, hash: &str) -> bool;

    /// 事件是否已计入统计
    fn is_counted(&self, fingerprint: &str) -> bool;

    /// 唯一的写入路径
    fn commit(&self, delta: GraphDelta) -> Result<CommitReport>;

    /// 清空全部数据（显式重置）
    fn reset(&self) -> Result<()>;
}

/// 一次提交的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub nodes_added: usize,
    /// 已存在节点获得新标签的数量
    pub nodes_updated: usize,
    pub edges_added: usize,
    pub edges_merged: usize,
    pub hashes_recorded: usize,
    pub events_counted: usize,
}

/// 完整的存储状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub nodes: IndexMap<Address, Node>,
    pub edges: IndexMap<LinkKey, Edge>,
    pub stats: StatsSummary,
    pub tags: TagTable,
    /// 已分类的交易哈希
    pub processed: IndexSet<String>,
    /// 已计入统计的事件指纹
    pub counted: IndexSet<String>,
}

impl StoreState {
    /// 应用增量
    pub fn apply(&mut self, delta: GraphDelta) -> CommitReport {
        let mut report = CommitReport::default();

        for node in delta.nodes {
            match self.nodes.entry(node.id.clone()) {
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    if existing.merge_tags(&node.tags) > 0 {
                        report.nodes_updated += 1;
                    }
                    if existing.label.is_none() {
                        existing.label = node.label;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(node);
                    report.nodes_added += 1;
                }
            }
        }

        for edge in delta.edges {
            match self.edges.entry(edge.key()) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().absorb(&edge);
                    report.edges_merged += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(edge);
                    report.edges_added += 1;
                }
            }
        }

        self.stats.merge(&delta.stats);
        self.tags.merge(&delta.tags);

        for hash in delta.hashes {
            if self.processed.insert(hash) {
                report.hashes_recorded += 1;
            }
        }

        for fingerprint in delta.fingerprints {
            if self.counted.insert(fingerprint) {
                report.events_counted += 1;
            }
        }

        report
    }
}
