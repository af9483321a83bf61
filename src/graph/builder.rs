//! 图构建器
//!
//! 持有一次调用的内存工作集，并通过存储查询已持久化的节点，
//! 保证重复处理重叠的邻域时不会重复创建节点

use super::edge::{AssetKey, Edge, LinkKey};
use super::node::Node;
use crate::classify::Action;
use crate::event::LedgerEvent;
use crate::reference::{LabelTable, TagTable};
use crate::stats::StatsDelta;
use crate::storage::GraphStore;
use crate::types::Address;
use indexmap::IndexMap;
use tracing::{debug, trace};

/// 待提交的增量
#[derive(Debug, Clone, Default)]
pub struct GraphDelta {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub stats: StatsDelta,
    pub tags: TagTable,
    /// 本批次成功分类的交易哈希
    pub hashes: Vec<String>,
    /// 本批次首次计入统计的事件指纹
    pub fingerprints: Vec<String>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.hashes.is_empty()
            && self.fingerprints.is_empty()
    }
}

/// 图构建器
pub struct GraphBuilder<'a> {
    store: &'a dyn GraphStore,
    tags: &'a TagTable,
    labels: &'a LabelTable,
    central: &'a Address,
    nodes: IndexMap<Address, Node>,
    edges: IndexMap<LinkKey, Edge>,
    wallets: u64,
    contracts: u64,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        store: &'a dyn GraphStore,
        tags: &'a TagTable,
        labels: &'a LabelTable,
        central: &'a Address,
    ) -> Self {
        Self {
            store,
            tags,
            labels,
            central,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            wallets: 0,
            contracts: 0,
        }
    }

    fn is_known(&self, address: &Address) -> bool {
        self.nodes.contains_key(address) || self.store.contains_node(address)
    }

    /// 添加节点；已存在于工作集或存储中时不做任何事。返回是否新建
    pub fn add_node(&mut self, address: &Address, is_contract: bool) -> bool {
        if address.is_empty() || self.is_known(address) {
            return false;
        }

        let mut node = Node::new(address.clone(), is_contract)
            .with_label(self.labels.get(address).cloned());
        if let Some(reference) = self.tags.get(address) {
            node.merge_tags(reference);
        }

        if is_contract {
            self.contracts += 1;
        } else {
            self.wallets += 1;
        }
        trace!(address = %address, is_contract, "新建节点");
        self.nodes.insert(address.clone(), node);
        true
    }

    /// 添加只带参考标签的节点（低精度模式）
    pub fn add_plain_node(&mut self, address: &Address) -> bool {
        if address.is_empty() || self.is_known(address) {
            return false;
        }

        let mut node = Node::plain(address.clone()).with_label(self.labels.get(address).cloned());
        if let Some(reference) = self.tags.get(address) {
            node.merge_tags(reference);
        }
        self.nodes.insert(address.clone(), node);
        true
    }

    /// 添加一条资产流
    ///
    /// `create_nodes` 为真时先创建两端节点：中心地址为钱包，另一端为合约；
    /// 两端都不是中心地址时发送方为钱包。角色不同的调用方应预先调用 `add_node`。
    pub fn add_link(
        &mut self,
        from: &Address,
        to: &Address,
        asset: &LedgerEvent,
        action: Option<Action>,
        create_nodes: bool,
    ) -> bool {
        if from.is_empty() || to.is_empty() {
            debug!(hash = %asset.hash, "资产流端点为空，跳过");
            return false;
        }

        if create_nodes {
            if to == self.central {
                self.add_node(to, false);
                self.add_node(from, true);
            } else {
                self.add_node(from, false);
                self.add_node(to, true);
            }
        }

        let asset_key = AssetKey::of(asset);
        self.upsert_edge(from, to, asset, action, asset_key)
    }

    /// 低精度模式：按 (from, to, symbol) 累加，不记录动作
    pub fn add_linear_link(&mut self, event: &LedgerEvent) -> bool {
        if event.from.is_empty() || event.to.is_empty() {
            return false;
        }
        self.add_plain_node(&event.from);
        self.add_plain_node(&event.to);
        let asset_key = AssetKey::Fungible(event.symbol.clone());
        self.upsert_edge(&event.from, &event.to, event, None, asset_key)
    }

    /// 返回是否新建了边
    fn upsert_edge(
        &mut self,
        from: &Address,
        to: &Address,
        asset: &LedgerEvent,
        action: Option<Action>,
        asset_key: AssetKey,
    ) -> bool {
        let key = LinkKey::new(from.clone(), to.clone(), asset_key);
        match self.edges.get_mut(&key) {
            Some(edge) => {
                edge.observe(asset.converted_value, action);
                false
            }
            None => {
                let edge = Edge::from_event(from, to, asset, action, &key.asset);
                trace!(key = %key, "新建边");
                self.edges.insert(key, edge);
                true
            }
        }
    }

    pub fn node(&self, address: &Address) -> Option<&Node> {
        self.nodes.get(address)
    }

    pub fn edge(&self, key: &LinkKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// 新建的钱包 / 合约节点数
    pub fn role_counts(&self) -> (u64, u64) {
        (self.wallets, self.contracts)
    }

    /// 交出工作集；统计中的钱包、合约数取自本次新建的节点
    pub fn into_delta(self) -> GraphDelta {
        GraphDelta {
            nodes: self.nodes.into_values().collect(),
            edges: self.edges.into_values().collect(),
            stats: StatsDelta {
                wallet: self.wallets,
                contract: self.contracts,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
