//! 边定义
//!
//! 边由 (source, target, 资产键) 唯一确定：同质化资产按符号区分，
//! 非同质化资产额外携带 token id，保证同一对地址间的不同资产互不合并

use crate::classify::Action;
use crate::event::LedgerEvent;
use crate::types::{Address, EventKind};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 资产键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKey {
    Fungible(String),
    NonFungible { symbol: String, token_id: String },
}

impl AssetKey {
    /// 从事件推导资产键
    pub fn of(event: &LedgerEvent) -> Self {
        match (&event.token_id, event.kind.is_non_fungible()) {
            (Some(token_id), true) => AssetKey::NonFungible {
                symbol: event.symbol.clone(),
                token_id: token_id.clone(),
            },
            _ => AssetKey::Fungible(event.symbol.clone()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            AssetKey::Fungible(symbol) => symbol,
            AssetKey::NonFungible { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Fungible(symbol) => f.write_str(symbol),
            AssetKey::NonFungible { symbol, token_id } => write!(f, "{}#{}", symbol, token_id),
        }
    }
}

/// 边的复合键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub source: Address,
    pub target: Address,
    pub asset: AssetKey,
}

impl LinkKey {
    pub fn new(source: Address, target: Address, asset: AssetKey) -> Self {
        Self {
            source,
            target,
            asset,
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.source, self.target, self.asset)
    }
}

/// 边
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Address,
    pub target: Address,
    pub symbol: String,
    pub name: String,
    pub contract: Address,
    pub token_id: Option<String>,
    /// 累计次数
    pub count: u64,
    /// 累计换算后数值
    pub sum: f64,
    /// 观察到的动作
    pub actions: IndexSet<Action>,
    pub kind: EventKind,
}

impl Edge {
    /// 以事件的资产属性创建边，count = 1
    pub fn from_event(
        source: &Address,
        target: &Address,
        event: &LedgerEvent,
        action: Option<Action>,
        asset: &AssetKey,
    ) -> Self {
        let token_id = match asset {
            AssetKey::NonFungible { token_id, .. } => Some(token_id.clone()),
            AssetKey::Fungible(_) => None,
        };
        Self {
            source: source.clone(),
            target: target.clone(),
            symbol: event.symbol.clone(),
            name: event.name.clone(),
            contract: event.contract_address.clone(),
            token_id,
            count: 1,
            sum: event.converted_value,
            actions: action.into_iter().collect(),
            kind: event.kind,
        }
    }

    pub fn key(&self) -> LinkKey {
        let asset = match &self.token_id {
            Some(token_id) => AssetKey::NonFungible {
                symbol: self.symbol.clone(),
                token_id: token_id.clone(),
            },
            None => AssetKey::Fungible(self.symbol.clone()),
        };
        LinkKey::new(self.source.clone(), self.target.clone(), asset)
    }

    /// 再观察到一次同键资产流
    pub fn observe(&mut self, value: f64, action: Option<Action>) {
        self.count += 1;
        self.sum += value;
        if let Some(action) = action {
            self.actions.insert(action);
        }
    }

    /// 累加另一条同键边（计数、数值相加，动作取并集）
    pub fn absorb(&mut self, other: &Edge) {
        self.count += other.count;
        self.sum += other.sum;
        self.actions.extend(other.actions.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenAmount;
    use chrono::DateTime;

    fn transfer(kind: EventKind, symbol: &str, token_id: Option<&str>) -> LedgerEvent {
        LedgerEvent {
            chain: "eth".to_string(),
            kind,
            hash: "0x01".to_string(),
            from: Address::parse("0x742d35cc6634c0532925a3b844bc9e7595f5bb01").unwrap(),
            to: Address::parse("0x8ba1f109551bd432803012645ac136ddd64dba72").unwrap(),
            raw_value: TokenAmount::from_u64(7),
            converted_value: 1.0,
            token_id: token_id.map(|s| s.to_string()),
            contract_address: Address::default(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals: 0,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            is_error: false,
            method_id: String::new(),
            function_name: String::new(),
        }
    }

    #[test]
    fn test_asset_key_distinguishes_token_ids() {
        let a = AssetKey::of(&transfer(EventKind::Erc721, "PUNK", Some("7")));
        let b = AssetKey::of(&transfer(EventKind::Erc721, "PUNK", Some("8")));
        let c = AssetKey::of(&transfer(EventKind::Erc20, "USDC", None));
        assert_ne!(a, b);
        assert_eq!(a.symbol(), "PUNK");
        assert_eq!(a.to_string(), "PUNK#7");
        assert_eq!(c, AssetKey::Fungible("USDC".to_string()));
    }

    #[test]
    fn test_edge_accumulation() {
        let event = transfer(EventKind::Erc20, "USDC", None);
        let asset = AssetKey::of(&event);
        let mut edge = Edge::from_event(&event.from, &event.to, &event, Some(Action::TransferToken), &asset);
        assert_eq!(edge.key().asset, asset);

        edge.observe(2.5, Some(Action::TransferToken));
        edge.observe(1.0, Some(Action::DepositToken));
        assert_eq!(edge.count, 3);
        assert!((edge.sum - 4.5).abs() < 1e-9);
        assert_eq!(edge.actions.len(), 2);

        let other = edge.clone();
        edge.absorb(&other);
        assert_eq!(edge.count, 6);
        assert_eq!(edge.actions.len(), 2);
        assert_eq!(
            edge.key().to_string(),
            "0x742d35cc6634c0532925a3b844bc9e7595f5bb01->0x8ba1f109551bd432803012645ac136ddd64dba72:USDC"
        );
    }
}
