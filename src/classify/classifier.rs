//! 瀑布式分类器
//!
//! 对每个事件组依次尝试规则表，首个命中者生效；未命中的形态记录日志后跳过，
//! 不影响同批次的其他组。

use super::action::Action;
use super::rules::{
    AnchorContext, Emission, Role, ANCHOR_RULES, GROUP_RULES, ROW_RULES,
};
use crate::event::{EventGroup, LedgerEvent};
use crate::graph::GraphBuilder;
use crate::types::{Address, EventKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, error, warn};

/// 未识别形态的日志 target，与一般处理错误区分
pub const UNCLASSIFIED_TARGET: &str = "chainflow::unclassified";

/// 单组匹配结果（纯函数，不修改图）
#[derive(Debug)]
pub enum GroupMatch<'e> {
    /// 缺少锚点
    Incomplete,
    Matched {
        emissions: Vec<Emission<'e>>,
        /// 组内未被任何规则覆盖的记录
        unmatched: Vec<&'e LedgerEvent>,
    },
    Unmatched,
}

/// 单组分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Incomplete,
    Classified {
        actions: Vec<Action>,
        unmatched_rows: usize,
    },
    Unclassified,
}

/// 一次分类运行的汇总，由调用方合并进持久化统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRunResult {
    pub groups: usize,
    pub incomplete: usize,
    pub classified: usize,
    pub unclassified: usize,
    /// 已分类组中未覆盖的记录数
    pub unmatched_rows: usize,
    pub actions: IndexMap<Action, usize>,
    /// 成功分类的交易哈希，提交后不再重新分类
    pub classified_hashes: Vec<String>,
    pub unclassified_hashes: Vec<String>,
}

impl ClassificationRunResult {
    pub fn record(&mut self, hash: &str, outcome: &GroupOutcome) {
        self.groups += 1;
        match outcome {
            GroupOutcome::Incomplete => self.incomplete += 1,
            GroupOutcome::Classified {
                actions,
                unmatched_rows,
            } => {
                self.classified += 1;
                self.unmatched_rows += unmatched_rows;
                self.classified_hashes.push(hash.to_string());
                for action in actions {
                    *self.actions.entry(*action).or_insert(0) += 1;
                }
            }
            GroupOutcome::Unclassified => {
                self.unclassified += 1;
                self.unclassified_hashes.push(hash.to_string());
            }
        }
    }

    pub fn merge(&mut self, other: &ClassificationRunResult) {
        self.groups += other.groups;
        self.incomplete += other.incomplete;
        self.classified += other.classified;
        self.unclassified += other.unclassified;
        self.unmatched_rows += other.unmatched_rows;
        for (action, count) in &other.actions {
            *self.actions.entry(*action).or_insert(0) += count;
        }
        self.classified_hashes
            .extend(other.classified_hashes.iter().cloned());
        self.unclassified_hashes
            .extend(other.unclassified_hashes.iter().cloned());
    }

    pub fn action_count(&self, action: Action) -> usize {
        self.actions.get(&action).copied().unwrap_or(0)
    }
}

/// 分类器
pub struct Classifier<'c> {
    central: &'c Address,
}

impl<'c> Classifier<'c> {
    pub fn new(central: &'c Address) -> Self {
        Self { central }
    }

    /// 匹配单组，不产生副作用
    pub fn match_group<'e>(&self, group: &'e EventGroup) -> GroupMatch<'e> {
        let Some(anchor) = group.anchor() else {
            return GroupMatch::Incomplete;
        };
        let cx = AnchorContext::new(anchor, self.central);

        if group.len() == 1 {
            return match ANCHOR_RULES.iter().find(|rule| (rule.matches)(&cx)) {
                Some(rule) => GroupMatch::Matched {
                    emissions: vec![rule.emit(&cx)],
                    unmatched: Vec::new(),
                },
                None => GroupMatch::Unmatched,
            };
        }

        let rows = group.rows();
        for rule in GROUP_RULES {
            let mut emission = Emission::new(rule.action);
            if (rule.apply)(&cx, &rows, &mut emission) {
                return GroupMatch::Matched {
                    emissions: vec![emission],
                    unmatched: Vec::new(),
                };
            }
        }

        let mut emissions = Vec::new();
        let mut unmatched = Vec::new();
        for row in rows {
            let rule = ROW_RULES
                .iter()
                .filter(|rule| rule.kind == row.kind)
                .find(|rule| (rule.matches)(&cx, row));
            match rule {
                Some(rule) => {
                    let mut emission = Emission::new(rule.action);
                    (rule.emit)(&cx, row, &mut emission);
                    emissions.push(emission);
                }
                None => unmatched.push(row),
            }
        }

        if emissions.is_empty() {
            GroupMatch::Unmatched
        } else {
            GroupMatch::Matched {
                emissions,
                unmatched,
            }
        }
    }

    /// 分类单组并把结果写入构建器
    pub fn classify_group(&self, group: &EventGroup, builder: &mut GraphBuilder<'_>) -> GroupOutcome {
        match self.match_group(group) {
            GroupMatch::Incomplete => {
                warn!(hash = %group.hash(), size = group.len(), "事件组缺少原生交易，跳过");
                GroupOutcome::Incomplete
            }
            GroupMatch::Unmatched => {
                error!(
                    target: UNCLASSIFIED_TARGET,
                    hash = %group.hash(),
                    size = group.len(),
                    "未识别的交易形态\n{}",
                    dump_group(group)
                );
                GroupOutcome::Unclassified
            }
            GroupMatch::Matched {
                emissions,
                unmatched,
            } => {
                let anchor_only = group.len() == 1;
                if !anchor_only {
                    if let Some(anchor) = group.anchor() {
                        builder.add_node(&anchor.from, false);
                        builder.add_node(&anchor.to, true);
                    }
                }

                // 同一组内锚点支付只计一次
                let mut paid = false;
                for emission in &emissions {
                    for (address, role) in &emission.roles {
                        builder.add_node(address, *role == Role::Contract);
                    }
                    for flow in &emission.flows {
                        if flow.asset.kind == EventKind::Native {
                            if paid {
                                continue;
                            }
                            paid = true;
                        }
                        builder.add_link(
                            &flow.from,
                            &flow.to,
                            flow.asset,
                            Some(emission.action),
                            !anchor_only,
                        );
                    }
                }

                for row in &unmatched {
                    error!(
                        target: UNCLASSIFIED_TARGET,
                        hash = %group.hash(),
                        kind = %row.kind,
                        from = %row.from,
                        to = %row.to,
                        "组内记录未被任何规则覆盖"
                    );
                }

                let actions: Vec<Action> = emissions.iter().map(|e| e.action).collect();
                debug!(hash = %group.hash(), actions = ?actions, "已分类");
                GroupOutcome::Classified {
                    actions,
                    unmatched_rows: unmatched.len(),
                }
            }
        }
    }

    /// 分类整批事件组
    pub fn classify_all(
        &self,
        groups: &[EventGroup],
        builder: &mut GraphBuilder<'_>,
    ) -> ClassificationRunResult {
        let mut result = ClassificationRunResult::default();
        for group in groups {
            let outcome = self.classify_group(group, builder);
            result.record(group.hash(), &outcome);
        }
        result
    }
}

/// 组内容转储，供人工补充规则
fn dump_group(group: &EventGroup) -> String {
    let mut out = String::new();
    for event in group.events() {
        let _ = writeln!(
            out,
            "  {:<10} {} -> {} {} {} contract={} fn={}",
            event.kind.as_str(),
            event.from,
            event.to,
            event.converted_value,
            event.symbol,
            event.contract_address,
            event.function_name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{LabelTable, TagTable};
    use crate::storage::MemoryStore;
    use crate::types::TokenAmount;
    use chrono::DateTime;

    fn addr(n: u64) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn central() -> Address {
        addr(0xa)
    }

    fn event(kind: EventKind, from: &Address, to: &Address, value: u64) -> LedgerEvent {
        LedgerEvent {
            chain: "eth".to_string(),
            kind,
            hash: "0xabc".to_string(),
            from: from.clone(),
            to: to.clone(),
            raw_value: TokenAmount::from_u64(value),
            converted_value: value as f64,
            token_id: None,
            contract_address: Address::default(),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 0,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            is_error: false,
            method_id: String::new(),
            function_name: String::new(),
        }
    }

    fn native(from: &Address, to: &Address, value: u64, func: &str) -> LedgerEvent {
        let mut e = event(EventKind::Native, from, to, value);
        e.function_name = func.to_string();
        e
    }

    fn token(from: &Address, to: &Address, contract: &Address, symbol: &str) -> LedgerEvent {
        let mut e = event(EventKind::Erc20, from, to, 100);
        e.contract_address = contract.clone();
        e.symbol = symbol.to_string();
        e.name = symbol.to_string();
        e
    }

    fn nft(from: &Address, to: &Address, contract: &Address, id: u64) -> LedgerEvent {
        let mut e = event(EventKind::Erc721, from, to, id);
        e.contract_address = contract.clone();
        e.converted_value = 1.0;
        e.token_id = Some(id.to_string());
        e.symbol = "PUNK".to_string();
        e
    }

    fn group(events: Vec<LedgerEvent>) -> EventGroup {
        EventGroup::new("0xabc".to_string(), events)
    }

    fn actions_of(m: &GroupMatch<'_>) -> Vec<Action> {
        match m {
            GroupMatch::Matched { emissions, .. } => emissions.iter().map(|e| e.action).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_anchor_only_waterfall() {
        let c = central();
        let other = addr(0xb);
        let classifier = Classifier::new(&c);

        let cases = [
            (native(&c, &other, 5, ""), Action::EtherMove),
            (native(&c, &c, 0, ""), Action::SelfDeposit),
            (native(&c, &other, 5, "deposit()"), Action::Deposit),
            (native(&c, &other, 0, "approve(address,uint256)"), Action::ContractExecution),
            (native(&c, &other, 0, ""), Action::DoNothing),
        ];
        for (anchor, expected) in cases {
            let g = group(vec![anchor]);
            assert_eq!(actions_of(&classifier.match_group(&g)), vec![expected]);
        }
    }

    #[test]
    fn test_function_keyword_is_case_insensitive() {
        let c = central();
        let pool = addr(0xb);
        let classifier = Classifier::new(&c);
        let g = group(vec![native(&c, &pool, 5, "Deposit(uint256)")]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::Deposit]);
    }

    #[test]
    fn test_missing_anchor_is_incomplete() {
        let c = central();
        let classifier = Classifier::new(&c);
        let g = group(vec![token(&c, &addr(2), &addr(3), "USDC")]);
        assert!(matches!(classifier.match_group(&g), GroupMatch::Incomplete));
    }

    #[test]
    fn test_swap_token_by_token_needs_exactly_two_rows() {
        let c = central();
        let router = addr(0xb);
        let pool = addr(0xc);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &router, 0, "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"),
            token(&c, &pool, &addr(0x20), "USDC"),
            token(&pool, &c, &addr(0x21), "WBTC"),
        ]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::SwapTokenByToken]);

        // 三条代币记录的多跳兑换不在识别范围内
        let hop = addr(0xd);
        let g = group(vec![
            native(&c, &router, 0, "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"),
            token(&c, &pool, &addr(0x20), "USDC"),
            token(&pool, &hop, &addr(0x22), "WETH"),
            token(&hop, &router, &addr(0x21), "WBTC"),
        ]);
        assert!(matches!(classifier.match_group(&g), GroupMatch::Unmatched));
    }

    #[test]
    fn test_swap_token_by_ether() {
        let c = central();
        let router = addr(0xb);
        let pool = addr(0xc);
        let classifier = Classifier::new(&c);

        let swap = "swapExactTokensForETH(uint256,uint256,address[],address,uint256)";
        let token_leg = token(&c, &pool, &addr(0x20), "USDC");
        let ether_leg = event(EventKind::Internal, &router, &c, 3);

        // 规范化后内部交易排在代币记录之前，两种顺序都应识别
        for rows in [
            vec![token_leg.clone(), ether_leg.clone()],
            vec![ether_leg.clone(), token_leg.clone()],
        ] {
            let mut events = vec![native(&c, &router, 0, swap)];
            events.extend(rows);
            let g = group(events);
            match classifier.match_group(&g) {
                GroupMatch::Matched {
                    emissions,
                    unmatched,
                } => {
                    assert_eq!(emissions.len(), 1);
                    assert_eq!(emissions[0].action, Action::SwapTokenByEther);
                    assert_eq!(emissions[0].flows.len(), 2);
                    assert!(unmatched.is_empty());
                }
                other => panic!("unexpected match: {:?}", other),
            }
        }
    }

    #[test]
    fn test_swap_token_by_token_ignores_row_order() {
        let c = central();
        let router = addr(0xb);
        let pool = addr(0xc);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &router, 0, "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"),
            token(&pool, &c, &addr(0x21), "WBTC"),
            token(&c, &pool, &addr(0x20), "USDC"),
        ]);
        let m = classifier.match_group(&g);
        assert_eq!(actions_of(&m), vec![Action::SwapTokenByToken]);
        if let GroupMatch::Matched { emissions, .. } = m {
            assert_eq!(emissions[0].flows[0].asset.symbol, "USDC");
            assert_eq!(emissions[0].flows[1].asset.symbol, "WBTC");
        }
    }

    #[test]
    fn test_buy_nft_with_ether_correlates_rows() {
        let c = central();
        let market = addr(0xb);
        let seller = addr(0xc);
        let collection = addr(0xd);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &market, 10, "fulfillBasicOrder(tuple)"),
            nft(&seller, &c, &collection, 7),
            event(EventKind::Internal, &market, &seller, 10),
        ]);
        let m = classifier.match_group(&g);
        assert_eq!(actions_of(&m), vec![Action::BuyNftWithEther]);
        if let GroupMatch::Matched { emissions, .. } = m {
            let flows = &emissions[0].flows;
            assert_eq!(flows.len(), 2);
            assert_eq!((&flows[0].from, &flows[0].to), (&c, &market));
            assert_eq!((&flows[1].from, &flows[1].to), (&seller, &c));
        }
    }

    #[test]
    fn test_row_rules_mint_and_burn() {
        let c = central();
        let collection = addr(0xd);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &collection, 0, "mint()"),
            nft(&Address::zero(), &c, &collection, 7),
        ]);
        let m = classifier.match_group(&g);
        assert_eq!(actions_of(&m), vec![Action::MintNft]);
        if let GroupMatch::Matched { emissions, .. } = m {
            assert_eq!(emissions[0].flows[0].from, collection);
            assert_eq!(emissions[0].flows[0].to, c);
        }

        let usdc = addr(0x20);
        let g = group(vec![
            native(&c, &usdc, 0, "burn(uint256)"),
            token(&c, &Address::zero(), &usdc, "USDC"),
        ]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::BurnToken]);
    }

    #[test]
    fn test_row_rule_priority_stake_before_transfer() {
        let c = central();
        let staking = addr(0xb);
        let token_contract = addr(0x20);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &token_contract, 0, "stake(uint256)"),
            token(&c, &staking, &token_contract, "LDO"),
        ]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::StakeToken]);

        let g = group(vec![
            native(&c, &token_contract, 0, "transfer(address,uint256)"),
            token(&c, &staking, &token_contract, "LDO"),
        ]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::TransferToken]);
    }

    #[test]
    fn test_receive_ether_from_internal_call() {
        let c = central();
        let weth = addr(0xb);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &weth, 0, "withdraw(uint256)"),
            event(EventKind::Internal, &weth, &c, 2),
        ]);
        assert_eq!(actions_of(&classifier.match_group(&g)), vec![Action::WithdrawEther]);
    }

    #[test]
    fn test_partial_match_reports_unmatched_rows() {
        let c = central();
        let contract = addr(0xb);
        let stranger = addr(0xc);
        let classifier = Classifier::new(&c);

        let g = group(vec![
            native(&c, &contract, 0, "multicall(bytes[])"),
            token(&c, &Address::zero(), &addr(0x20), "USDC"),
            token(&stranger, &addr(0xd), &addr(0x21), "DAI"),
        ]);
        match classifier.match_group(&g) {
            GroupMatch::Matched {
                emissions,
                unmatched,
            } => {
                assert_eq!(emissions.len(), 1);
                assert_eq!(unmatched.len(), 1);
                assert_eq!(unmatched[0].symbol, "DAI");
            }
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_classify_all_isolates_unmatched_groups() {
        let c = central();
        let stranger = addr(0xc);
        let store = MemoryStore::new();
        let tags = TagTable::new();
        let labels = LabelTable::new();
        let mut builder = GraphBuilder::new(&store, &tags, &labels, &c);
        let classifier = Classifier::new(&c);

        let unmatched = EventGroup::new(
            "0x01".to_string(),
            vec![
                native(&stranger, &addr(0xd), 0, "foo()"),
                token(&stranger, &addr(0xe), &addr(0x20), "USDC"),
            ],
        );
        let plain = EventGroup::new("0x02".to_string(), vec![native(&c, &addr(0xb), 5, "")]);

        let result = classifier.classify_all(&[unmatched, plain], &mut builder);
        assert_eq!(result.groups, 2);
        assert_eq!(result.unclassified, 1);
        assert_eq!(result.classified, 1);
        assert_eq!(result.unclassified_hashes, vec!["0x01".to_string()]);
        assert_eq!(result.classified_hashes, vec!["0x02".to_string()]);
        assert_eq!(result.action_count(Action::EtherMove), 1);

        let delta = builder.into_delta();
        assert_eq!(delta.edges.len(), 1);
        assert_eq!(delta.nodes.len(), 2);
    }

    #[test]
    fn test_anchor_payment_counted_once_per_group() {
        let c = central();
        let market = addr(0xb);
        let collection = addr(0xd);
        let store = MemoryStore::new();
        let tags = TagTable::new();
        let labels = LabelTable::new();
        let mut builder = GraphBuilder::new(&store, &tags, &labels, &c);
        let classifier = Classifier::new(&c);

        // 一笔付款买入两个 NFT
        let g = group(vec![
            native(&c, &market, 10, "buy(uint256[])"),
            nft(&addr(0xe), &c, &collection, 1),
            nft(&addr(0xf), &c, &collection, 2),
        ]);
        let outcome = classifier.classify_group(&g, &mut builder);
        assert_eq!(
            outcome,
            GroupOutcome::Classified {
                actions: vec![Action::BuyNft, Action::BuyNft],
                unmatched_rows: 0
            }
        );

        let delta = builder.into_delta();
        let payments: Vec<_> = delta.edges.iter().filter(|e| e.symbol == "ETH").collect();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].count, 1);
        assert_eq!(delta.edges.len(), 3);
    }
}
