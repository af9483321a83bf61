//! 低精度构图：不分组、不分类，每条事件直接连一条边

use super::builder::GraphBuilder;
use crate::event::LedgerEvent;
use tracing::debug;

/// 逐条事件构图，返回新建的边数
pub fn build_linear(events: &[LedgerEvent], builder: &mut GraphBuilder<'_>) -> usize {
    let mut created = 0;
    for event in events.iter().filter(|e| !e.is_error) {
        if builder.add_linear_link(event) {
            created += 1;
        }
    }
    debug!(events = events.len(), edges = created, "低精度构图完成");
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{AddressTag, LabelTable, TagTable};
    use crate::storage::MemoryStore;
    use crate::types::{Address, EventKind, TokenAmount};
    use chrono::DateTime;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn event(kind: EventKind, from: &Address, to: &Address, symbol: &str, token_id: Option<&str>) -> LedgerEvent {
        LedgerEvent {
            chain: "eth".to_string(),
            kind,
            hash: "0x01".to_string(),
            from: from.clone(),
            to: to.clone(),
            raw_value: TokenAmount::from_u64(1),
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
    fn test_linear_mode_keys_by_symbol_only() {
        let central = addr(1);
        let other = addr(2);
        let store = MemoryStore::new();
        let mut tags = TagTable::new();
        tags.seed_central(&central);
        let labels = LabelTable::new();
        let mut builder = GraphBuilder::new(&store, &tags, &labels, &central);

        // 无锚点的记录在低精度模式下同样构图
        let mut errored = event(EventKind::Native, &central, &other, "ETH", None);
        errored.is_error = true;
        let events = vec![
            event(EventKind::Erc721, &other, &central, "PUNK", Some("1")),
            event(EventKind::Erc721, &other, &central, "PUNK", Some("2")),
            errored,
        ];

        assert_eq!(build_linear(&events, &mut builder), 1);
        let central_node = builder.node(&central).unwrap();
        assert!(central_node.has_tag(AddressTag::Central));
        assert!(!central_node.has_tag(AddressTag::Wallet));

        let delta = builder.into_delta();
        assert_eq!(delta.edges.len(), 1);
        assert_eq!(delta.edges[0].count, 2);
        assert!(delta.edges[0].token_id.is_none());
    }
}
