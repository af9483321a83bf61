//! 图读取与展示
//!
//! 把按资产区分的存储边重新按 (source, target) 分组，每组一条展示边，
//! 附带按符号索引的资产明细。纯函数，不修改存储。

use super::edge::Edge;
use super::node::Node;
use crate::classify::Action;
use crate::reference::TagTable;
use crate::storage::GraphStore;
use crate::types::{Address, EventKind};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// 单种资产的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetail {
    pub contract: Address,
    pub name: String,
    pub count: u64,
    pub sum: f64,
    pub actions: IndexSet<Action>,
    pub kind: EventKind,
}

/// 展示边
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationEdge {
    pub source: Address,
    pub target: Address,
    /// 符号 -> 明细
    pub detail: IndexMap<String, AssetDetail>,
    /// 各资产次数之和
    pub qty: u64,
}

/// 可视化载荷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<Node>,
    pub links: Vec<PresentationEdge>,
}

impl GraphPayload {
    pub fn link(&self, source: &Address, target: &Address) -> Option<&PresentationEdge> {
        self.links
            .iter()
            .find(|l| &l.source == source && &l.target == target)
    }

    pub fn node(&self, id: &Address) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// 按 (source, target) 重新分组
pub fn group_edges(edges: &[Edge]) -> Vec<PresentationEdge> {
    let mut links: IndexMap<(Address, Address), PresentationEdge> = IndexMap::new();

    for edge in edges {
        let link = links
            .entry((edge.source.clone(), edge.target.clone()))
            .or_insert_with(|| PresentationEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                detail: IndexMap::new(),
                qty: 0,
            });

        link.qty += edge.count;
        match link.detail.get_mut(&edge.symbol) {
            Some(detail) => {
                detail.count += edge.count;
                detail.sum += edge.sum;
                detail.actions.extend(edge.actions.iter().copied());
            }
            None => {
                link.detail.insert(
                    edge.symbol.clone(),
                    AssetDetail {
                        contract: edge.contract.clone(),
                        name: edge.name.clone(),
                        count: edge.count,
                        sum: edge.sum,
                        actions: edge.actions.clone(),
                        kind: edge.kind,
                    },
                );
            }
        }
    }

    links.into_values().collect()
}

/// 组装载荷：节点标签并上当前参考标签
pub fn present_parts(nodes: Vec<Node>, edges: &[Edge], tags: &TagTable) -> GraphPayload {
    let nodes = nodes
        .into_iter()
        .map(|mut node| {
            if let Some(reference) = tags.get(&node.id) {
                node.merge_tags(reference);
            }
            node
        })
        .collect();

    GraphPayload {
        nodes,
        links: group_edges(edges),
    }
}

/// 从存储读取并组装载荷
pub fn present(store: &dyn GraphStore) -> GraphPayload {
    present_parts(store.nodes(), &store.edges(), &store.tags())
}
