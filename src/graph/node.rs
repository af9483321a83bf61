//! 节点定义
//!
//! 节点以地址为唯一 ID，标签集合只增不减

use crate::reference::{AddressTag, Label};
use crate::types::Address;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// 节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 节点 ID（地址）
    pub id: Address,
    /// 标签集合
    pub tags: IndexSet<AddressTag>,
    /// 外部名称与分类
    pub label: Option<Label>,
}

impl Node {
    /// 创建节点，附带一个初始角色标签
    pub fn new(id: Address, is_contract: bool) -> Self {
        let mut tags = IndexSet::new();
        tags.insert(Self::role_tag(is_contract));
        Self {
            id,
            tags,
            label: None,
        }
    }

    /// 不带角色标签的节点（低精度模式）
    pub fn plain(id: Address) -> Self {
        Self {
            id,
            tags: IndexSet::new(),
            label: None,
        }
    }

    pub fn role_tag(is_contract: bool) -> AddressTag {
        if is_contract {
            AddressTag::Contract
        } else {
            AddressTag::Wallet
        }
    }

    pub fn with_label(mut self, label: Option<Label>) -> Self {
        self.label = label;
        self
    }

    pub fn has_tag(&self, tag: AddressTag) -> bool {
        self.tags.contains(&tag)
    }

    /// 合并标签，返回新增数量
    pub fn merge_tags<'a, I>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = &'a AddressTag>,
    {
        tags.into_iter()
            .filter(|tag| self.tags.insert(**tag))
            .count()
    }
}
