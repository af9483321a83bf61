//! 声明式规则表
//!
//! 三张有序表：单条原生交易、整组关联、逐条记录。每条规则是一个针对
//! (锚点, 记录, 中心地址) 的谓词加上一个产出函数，按顺序首个命中者生效。

use super::action::Action;
use crate::event::LedgerEvent;
use crate::types::{Address, EventKind};

/// 节点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Wallet,
    Contract,
}

/// 一条有向资产流，资产属性（符号、名称、合约、数值、token id）取自 `asset`
#[derive(Debug, Clone)]
pub struct Flow<'e> {
    pub from: Address,
    pub to: Address,
    pub asset: &'e LedgerEvent,
}

impl<'e> Flow<'e> {
    pub fn new(from: &Address, to: &Address, asset: &'e LedgerEvent) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            asset,
        }
    }

    /// 记录自身的 from -> to
    pub fn of(asset: &'e LedgerEvent) -> Self {
        Self::new(&asset.from, &asset.to, asset)
    }
}

/// 规则命中后的产出
#[derive(Debug, Clone)]
pub struct Emission<'e> {
    pub action: Action,
    /// 需要预先确定角色的地址
    pub roles: Vec<(Address, Role)>,
    pub flows: Vec<Flow<'e>>,
}

impl<'e> Emission<'e> {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            roles: Vec::new(),
            flows: Vec::new(),
        }
    }

    pub fn push(&mut self, flow: Flow<'e>) {
        self.flows.push(flow);
    }

    pub fn assign(&mut self, address: &Address, role: Role) {
        self.roles.push((address.clone(), role));
    }
}

/// 锚点上下文：组内其余记录都与它比对
#[derive(Debug, Clone)]
pub struct AnchorContext<'e> {
    anchor: &'e LedgerEvent,
    central: Address,
    /// 小写的函数名（不含参数列表）
    function: String,
}

impl<'e> AnchorContext<'e> {
    pub fn new(anchor: &'e LedgerEvent, central: &Address) -> Self {
        Self {
            anchor,
            central: central.clone(),
            function: anchor.function_base().to_lowercase(),
        }
    }

    pub fn anchor(&self) -> &'e LedgerEvent {
        self.anchor
    }

    pub fn central(&self) -> &Address {
        &self.central
    }

    pub fn from(&self) -> &'e Address {
        &self.anchor.from
    }

    pub fn to(&self) -> &'e Address {
        &self.anchor.to
    }

    pub fn has_value(&self) -> bool {
        self.anchor.has_value()
    }

    pub fn has_function(&self) -> bool {
        !self.function.is_empty()
    }

    /// 函数名包含关键字（关键字须为小写）
    pub fn calls(&self, keyword: &str) -> bool {
        self.function.contains(keyword)
    }

    pub fn is_central(&self, address: &Address) -> bool {
        address == &self.central
    }

    /// 交易由中心地址发起
    pub fn sent_by_central(&self) -> bool {
        self.is_central(self.from())
    }

    /// 锚点携带的原生资产支付：from -> to
    pub fn payment(&self) -> Flow<'e> {
        Flow::of(self.anchor)
    }
}

/// 单条原生交易规则
pub struct AnchorRule {
    pub action: Action,
    pub matches: fn(&AnchorContext<'_>) -> bool,
    /// 是否产生 from -> to 的原生资产流
    pub moves_value: fn(&AnchorContext<'_>) -> bool,
}

impl AnchorRule {
    /// 发送方为钱包；接收方在带函数名时为合约，否则为钱包
    pub fn emit<'e>(&self, cx: &AnchorContext<'e>) -> Emission<'e> {
        let target_role = if cx.has_function() {
            Role::Contract
        } else {
            Role::Wallet
        };
        let mut emission = Emission::new(self.action);
        emission.assign(cx.from(), Role::Wallet);
        emission.assign(cx.to(), target_role);
        if (self.moves_value)(cx) {
            emission.push(cx.payment());
        }
        emission
    }
}

/// 整组关联规则：命中即消费整组
pub struct GroupRule {
    pub action: Action,
    pub apply: for<'e> fn(&AnchorContext<'e>, &[&'e LedgerEvent], &mut Emission<'e>) -> bool,
}

/// 逐条记录规则，只对 `kind` 类型的记录生效
pub struct RowRule {
    pub action: Action,
    pub kind: EventKind,
    pub matches: fn(&AnchorContext<'_>, &LedgerEvent) -> bool,
    pub emit: for<'e> fn(&AnchorContext<'e>, &'e LedgerEvent, &mut Emission<'e>),
}

pub static ANCHOR_RULES: &[AnchorRule] = &[
    AnchorRule {
        action: Action::EtherMove,
        matches: |cx| cx.has_value() && !cx.has_function(),
        moves_value: |_| true,
    },
    AnchorRule {
        action: Action::SelfDeposit,
        matches: |cx| cx.from() == cx.to(),
        moves_value: |cx| cx.has_value(),
    },
    AnchorRule {
        action: Action::Deposit,
        matches: |cx| cx.has_value() && cx.calls("deposit"),
        moves_value: |_| true,
    },
    AnchorRule {
        action: Action::ContractExecution,
        matches: |cx| cx.has_function(),
        moves_value: |_| false,
    },
    AnchorRule {
        action: Action::DoNothing,
        matches: |_| true,
        moves_value: |_| false,
    },
];

pub static GROUP_RULES: &[GroupRule] = &[
    GroupRule {
        action: Action::SwapTokenByToken,
        apply: swap_token_by_token,
    },
    GroupRule {
        action: Action::BuyNftWithToken,
        apply: buy_nft_with_token,
    },
    GroupRule {
        action: Action::SwapTokenByEther,
        apply: swap_token_by_ether,
    },
    GroupRule {
        action: Action::BuyNftWithEther,
        apply: buy_nft_with_ether,
    },
    GroupRule {
        action: Action::SwapTokenByMultitoken,
        apply: swap_token_by_multitoken,
    },
];

pub static ROW_RULES: &[RowRule] = &[
    // ERC-20
    RowRule {
        action: Action::SwapEtherByToken,
        kind: EventKind::Erc20,
        matches: |cx, row| {
            cx.has_value()
                && cx.calls("swap")
                && cx.sent_by_central()
                && cx.is_central(&row.to)
                && cx.to() != &row.from
                && row.from != row.contract_address
        },
        emit: emit_purchase,
    },
    RowRule {
        action: Action::DepositToken,
        kind: EventKind::Erc20,
        matches: |cx, row| {
            !cx.has_value()
                && cx.calls("deposit")
                && cx.sent_by_central()
                && cx.is_central(&row.from)
                && cx.to() == &row.to
                && row.to != row.contract_address
        },
        emit: emit_row,
    },
    RowRule {
        action: Action::StakeToken,
        kind: EventKind::Erc20,
        matches: |cx, row| cx.calls("stake") && cx.sent_by_central() && cx.is_central(&row.from),
        emit: emit_row,
    },
    RowRule {
        action: Action::BridgeToken,
        kind: EventKind::Erc20,
        matches: |cx, row| cx.calls("bridge") && cx.sent_by_central() && cx.is_central(&row.from),
        emit: emit_row,
    },
    RowRule {
        action: Action::AddLiquidity,
        kind: EventKind::Erc20,
        matches: |cx, row| {
            cx.calls("liquidity") && cx.sent_by_central() && cx.is_central(&row.from)
        },
        emit: emit_row,
    },
    RowRule {
        action: Action::BurnToken,
        kind: EventKind::Erc20,
        matches: |cx, row| row.to.is_zero() && cx.is_central(&row.from),
        emit: emit_burn,
    },
    RowRule {
        action: Action::MintToken,
        kind: EventKind::Erc20,
        matches: |cx, row| row.from.is_zero() && cx.is_central(&row.to),
        emit: emit_mint,
    },
    RowRule {
        action: Action::TransferToken,
        kind: EventKind::Erc20,
        matches: |cx, row| {
            cx.sent_by_central()
                && cx.is_central(&row.from)
                && cx.to() == &row.contract_address
                && !row.to.is_zero()
        },
        emit: emit_to_wallet,
    },
    RowRule {
        action: Action::WithdrawToken,
        kind: EventKind::Erc20,
        matches: |cx, row| {
            cx.calls("withdraw")
                && cx.sent_by_central()
                && cx.is_central(&row.to)
                && cx.to() == &row.from
        },
        emit: emit_row,
    },
    RowRule {
        action: Action::TransferTokenToWallet,
        kind: EventKind::Erc20,
        matches: |cx, row| cx.sent_by_central() && cx.is_central(&row.to) && cx.to() == &row.from,
        emit: emit_row,
    },
    // 内部调用
    RowRule {
        action: Action::WithdrawEther,
        kind: EventKind::Internal,
        matches: |cx, row| {
            cx.calls("withdraw")
                && cx.sent_by_central()
                && cx.is_central(&row.to)
                && cx.to() == &row.from
        },
        emit: emit_row,
    },
    RowRule {
        action: Action::SwapTokenByEther,
        kind: EventKind::Internal,
        matches: |cx, row| cx.calls("swap") && cx.from() == &row.to,
        emit: emit_row,
    },
    RowRule {
        action: Action::ReceiveEther,
        kind: EventKind::Internal,
        matches: |cx, row| cx.from() == &row.to,
        emit: emit_row,
    },
    // ERC-721
    RowRule {
        action: Action::MintNft,
        kind: EventKind::Erc721,
        matches: |cx, row| row.from.is_zero() && cx.sent_by_central() && cx.is_central(&row.to),
        emit: emit_mint,
    },
    RowRule {
        action: Action::TransferNft,
        kind: EventKind::Erc721,
        matches: |cx, row| {
            cx.sent_by_central()
                && cx.is_central(&row.from)
                && cx.to() == &row.contract_address
                && !row.to.is_zero()
        },
        emit: emit_to_wallet,
    },
    RowRule {
        action: Action::BurnNft,
        kind: EventKind::Erc721,
        matches: |cx, row| row.to.is_zero() && cx.is_central(&row.from),
        emit: emit_burn,
    },
    RowRule {
        action: Action::BuyNft,
        kind: EventKind::Erc721,
        matches: |cx, row| {
            cx.sent_by_central()
                && cx.is_central(&row.to)
                && cx.to() != &row.to
                && row.to != row.contract_address
                && !row.from.is_zero()
        },
        emit: emit_purchase,
    },
    RowRule {
        action: Action::TransferNftViaOperator,
        kind: EventKind::Erc721,
        matches: |cx, row| cx.sent_by_central() && cx.is_central(&row.from),
        emit: emit_row,
    },
    // ERC-1155
    RowRule {
        action: Action::MintMultitoken,
        kind: EventKind::Erc1155,
        matches: |cx, row| row.from.is_zero() && cx.is_central(&row.to),
        emit: emit_mint,
    },
    RowRule {
        action: Action::BurnMultitoken,
        kind: EventKind::Erc1155,
        matches: |cx, row| row.to.is_zero() && cx.is_central(&row.from),
        emit: emit_burn,
    },
    RowRule {
        action: Action::BuyMultitoken,
        kind: EventKind::Erc1155,
        matches: |cx, row| cx.has_value() && cx.sent_by_central() && cx.is_central(&row.to),
        emit: emit_purchase,
    },
    RowRule {
        action: Action::TransferMultitoken,
        kind: EventKind::Erc1155,
        matches: |cx, row| cx.sent_by_central() && cx.is_central(&row.from),
        emit: emit_row,
    },
];

fn first_of<'e>(rows: &[&'e LedgerEvent], kind: EventKind) -> Option<&'e LedgerEvent> {
    rows.iter().copied().find(|r| r.kind == kind)
}

fn count_of(rows: &[&LedgerEvent], kind: EventKind) -> usize {
    rows.iter().filter(|r| r.kind == kind).count()
}

/// 中心地址付出的指定类型记录
fn paid_by_central<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    kind: EventKind,
) -> Option<&'e LedgerEvent> {
    rows.iter()
        .copied()
        .find(|r| r.kind == kind && cx.is_central(&r.from))
}

/// 中心地址收到的指定类型记录
fn received_by_central<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    kind: EventKind,
) -> Option<&'e LedgerEvent> {
    rows.iter()
        .copied()
        .find(|r| r.kind == kind && cx.is_central(&r.to))
}

// 恰好两条 ERC-20：中心地址付出一种代币、收回另一种，与记录顺序无关
fn swap_token_by_token<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    emission: &mut Emission<'e>,
) -> bool {
    if rows.len() != 2 || count_of(rows, EventKind::Erc20) != 2 {
        return false;
    }
    if cx.has_value() || !cx.calls("swap") {
        return false;
    }
    let (Some(paid), Some(received)) = (
        paid_by_central(cx, rows, EventKind::Erc20),
        received_by_central(cx, rows, EventKind::Erc20),
    ) else {
        return false;
    };
    if std::ptr::eq(paid, received) {
        return false;
    }
    emission.push(Flow::of(paid));
    emission.push(Flow::of(received));
    true
}

fn buy_nft_with_token<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    emission: &mut Emission<'e>,
) -> bool {
    if cx.has_value() || !cx.calls("atomicmatch") {
        return false;
    }
    let (Some(nft), Some(token)) = (
        received_by_central(cx, rows, EventKind::Erc721),
        paid_by_central(cx, rows, EventKind::Erc20),
    ) else {
        return false;
    };
    emission.push(Flow::of(token));
    emission.push(Flow::of(nft));
    true
}

fn swap_token_by_ether<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    emission: &mut Emission<'e>,
) -> bool {
    if cx.has_value() || !cx.calls("swap") {
        return false;
    }
    let (Some(token), Some(ether)) = (
        paid_by_central(cx, rows, EventKind::Erc20),
        received_by_central(cx, rows, EventKind::Internal),
    ) else {
        return false;
    };
    emission.push(Flow::of(token));
    emission.push(Flow::of(ether));
    true
}

// 中心地址付款给市场合约，NFT 从卖家转给中心地址，合约再把款项转给卖家
fn buy_nft_with_ether<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    emission: &mut Emission<'e>,
) -> bool {
    if !cx.has_value() || !cx.sent_by_central() {
        return false;
    }
    let Some(nft) = rows
        .iter()
        .copied()
        .find(|r| r.kind == EventKind::Erc721 && &r.to == cx.from() && !r.from.is_zero())
    else {
        return false;
    };
    let seller_paid = rows
        .iter()
        .any(|r| r.kind == EventKind::Internal && &r.from == cx.to() && r.to == nft.from);
    if !seller_paid {
        return false;
    }
    emission.push(cx.payment());
    emission.push(Flow::new(&nft.from, cx.central(), nft));
    true
}

fn swap_token_by_multitoken<'e>(
    cx: &AnchorContext<'e>,
    rows: &[&'e LedgerEvent],
    emission: &mut Emission<'e>,
) -> bool {
    if count_of(rows, EventKind::Erc1155) != 1 || count_of(rows, EventKind::Erc20) != 1 {
        return false;
    }
    let (Some(token), Some(multi)) = (
        first_of(rows, EventKind::Erc20),
        first_of(rows, EventKind::Erc1155),
    ) else {
        return false;
    };
    if !cx.is_central(&token.from) || !cx.is_central(&multi.to) || token.to != multi.from {
        return false;
    }
    emission.push(Flow::of(token));
    emission.push(Flow::of(multi));
    true
}

fn emit_row<'e>(_cx: &AnchorContext<'e>, row: &'e LedgerEvent, emission: &mut Emission<'e>) {
    emission.push(Flow::of(row));
}

/// 接收方作为钱包
fn emit_to_wallet<'e>(_cx: &AnchorContext<'e>, row: &'e LedgerEvent, emission: &mut Emission<'e>) {
    emission.assign(&row.to, Role::Wallet);
    emission.push(Flow::of(row));
}

/// 销毁：资产流回代币合约
fn emit_burn<'e>(_cx: &AnchorContext<'e>, row: &'e LedgerEvent, emission: &mut Emission<'e>) {
    emission.push(Flow::new(&row.from, &row.contract_address, row));
}

/// 铸造：资产由代币合约流出；若锚点带值则同时记录支付
fn emit_mint<'e>(cx: &AnchorContext<'e>, row: &'e LedgerEvent, emission: &mut Emission<'e>) {
    if cx.has_value() {
        emission.push(cx.payment());
    }
    emission.push(Flow::new(&row.contract_address, &row.to, row));
}

/// 购买：锚点支付原生资产，记录的发送方把资产转给中心地址
fn emit_purchase<'e>(cx: &AnchorContext<'e>, row: &'e LedgerEvent, emission: &mut Emission<'e>) {
    if cx.has_value() {
        emission.push(cx.payment());
    }
    emission.push(Flow::new(&row.from, cx.central(), row));
}
