//! 内存存储

use super::{CommitReport, GraphStore, StoreState};
use crate::error::Result;
use crate::graph::{Edge, GraphDelta, LinkKey, Node};
use crate::reference::TagTable;
use crate::stats::StatsSummary;
use crate::types::Address;
use parking_lot::RwLock;

/// 内存存储（测试与一次性运行）
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// 当前状态的副本
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    pub(crate) fn replace(&self, state: StoreState) {
        *self.state.write() = state;
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }
}

impl GraphStore for MemoryStore {
    fn contains_node(&self, id: &Address) -> bool {
        self.state.read().nodes.contains_key(id)
    }

    fn node(&self, id: &Address) -> Option<Node> {
        self.state.read().nodes.get(id).cloned()
    }

    fn nodes(&self) -> Vec<Node> {
        self.state.read().nodes.values().cloned().collect()
    }

    fn edge(&self, key: &LinkKey) -> Option<Edge> {
        self.state.read().edges.get(key).cloned()
    }

    fn edges(&self) -> Vec<Edge> {
        self.state.read().edges.values().cloned().collect()
    }

    fn stats(&self) -> StatsSummary {
        self.state.read().stats
    }

    fn tags(&self) -> TagTable {
        self.state.read().tags.clone()
    }

    fn is_processed(&self, hash: &str) -> bool {
        self.state.read().processed.contains(hash)
    }

    fn is_counted(&self, fingerprint: &str) -> bool {
        self.state.read().counted.contains(fingerprint)
    }

    fn commit(&self, delta: GraphDelta) -> Result<CommitReport> {
        Ok(self.state.write().apply(delta))
    }

    fn reset(&self) -> Result<()> {
        *self.state.write() = StoreState::default();
        Ok(())
    }
}
