//! 地址标签表
//!
//! 外部写入 central / path 标记，另可从事件推导 funder 与 contract-creator

use crate::event::LedgerEvent;
use crate::types::{Address, EventKind};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 地址标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressTag {
    Wallet,
    Contract,
    Central,
    Path,
    Funder,
    ContractCreator,
}

impl AddressTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressTag::Wallet => "wallet",
            AddressTag::Contract => "contract",
            AddressTag::Central => "central",
            AddressTag::Path => "path",
            AddressTag::Funder => "funder",
            AddressTag::ContractCreator => "contract-creator",
        }
    }
}

impl fmt::Display for AddressTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 地址 -> 标签集合（只增不减）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagTable {
    tags: IndexMap<Address, IndexSet<AddressTag>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加标签，返回是否为新增
    pub fn add(&mut self, address: Address, tag: AddressTag) -> bool {
        self.tags.entry(address).or_default().insert(tag)
    }

    /// 标记被调查的中心地址（同时属于路径）
    pub fn seed_central(&mut self, address: &Address) {
        self.add(address.clone(), AddressTag::Central);
        self.add(address.clone(), AddressTag::Path);
    }

    pub fn add_path(&mut self, address: &Address) {
        self.add(address.clone(), AddressTag::Path);
    }

    pub fn get(&self, address: &Address) -> Option<&IndexSet<AddressTag>> {
        self.tags.get(address)
    }

    pub fn has(&self, address: &Address, tag: AddressTag) -> bool {
        self.tags
            .get(address)
            .map(|set| set.contains(&tag))
            .unwrap_or(false)
    }

    /// 合并另一张表
    pub fn merge(&mut self, other: &TagTable) {
        for (address, set) in &other.tags {
            let entry = self.tags.entry(address.clone()).or_default();
            entry.extend(set.iter().copied());
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &IndexSet<AddressTag>)> {
        self.tags.iter()
    }

    /// 从事件推导 funder 和 contract-creator 标签，返回新增数量
    ///
    /// funder: 在中心地址第一次转出之前向其转入的地址。
    /// contract-creator: 合约创建交易的发送方。
    pub fn derive_from_events(&mut self, events: &[LedgerEvent], central: &Address) -> usize {
        let mut added = 0;

        let first_outgoing = events
            .iter()
            .filter(|e| !e.is_error && &e.from == central)
            .map(|e| e.timestamp)
            .min();

        if let Some(cutoff) = first_outgoing {
            for event in events.iter().filter(|e| !e.is_error) {
                if &event.to == central
                    && event.timestamp < cutoff
                    && !event.from.is_empty()
                    && &event.from != central
                    && self.add(event.from.clone(), AddressTag::Funder)
                {
                    added += 1;
                }
            }
        }

        for event in events.iter().filter(|e| !e.is_error) {
            if event.kind == EventKind::Native
                && !event.contract_address.is_empty()
                && event.to == event.contract_address
                && self.add(event.from.clone(), AddressTag::ContractCreator)
            {
                added += 1;
            }
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenAmount;
    use chrono::DateTime;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n as u64 + 1)).unwrap()
    }

    fn event(from: &Address, to: &Address, ts: i64) -> LedgerEvent {
        LedgerEvent {
            chain: "eth".to_string(),
            kind: EventKind::Native,
            hash: format!("0x{:02x}", ts),
            from: from.clone(),
            to: to.clone(),
            raw_value: TokenAmount::from_u64(1),
            converted_value: 1.0,
            token_id: None,
            contract_address: Address::default(),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
            is_error: false,
            method_id: String::new(),
            function_name: String::new(),
        }
    }

    #[test]
    fn test_seed_central_and_merge_only_grows() {
        let mut table = TagTable::new();
        let a = addr(1);
        table.seed_central(&a);
        assert!(table.has(&a, AddressTag::Central));
        assert!(table.has(&a, AddressTag::Path));

        let mut other = TagTable::new();
        other.add(a.clone(), AddressTag::Funder);
        table.merge(&other);
        assert_eq!(table.get(&a).unwrap().len(), 3);
        assert!(!table.add(a.clone(), AddressTag::Path));
    }

    #[test]
    fn test_derive_funders_before_first_outgoing() {
        let central = addr(1);
        let early = addr(2);
        let late = addr(3);
        let dest = addr(4);
        let events = vec![
            event(&early, &central, 10),
            event(&central, &dest, 20),
            event(&late, &central, 30),
        ];

        let mut table = TagTable::new();
        table.derive_from_events(&events, &central);
        assert!(table.has(&early, AddressTag::Funder));
        assert!(!table.has(&late, AddressTag::Funder));
        assert!(!table.has(&dest, AddressTag::Funder));
    }

    #[test]
    fn test_no_outgoing_means_no_funders() {
        let central = addr(1);
        let events = vec![event(&addr(2), &central, 10)];
        let mut table = TagTable::new();
        assert_eq!(table.derive_from_events(&events, &central), 0);
    }

    #[test]
    fn test_derive_contract_creator() {
        let creator = addr(5);
        let contract = addr(6);
        let mut creation = event(&creator, &contract, 1);
        creation.contract_address = contract.clone();

        let mut table = TagTable::new();
        table.derive_from_events(&[creation], &addr(1));
        assert!(table.has(&creator, AddressTag::ContractCreator));
    }
}
