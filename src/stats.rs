//! 统计累加
//!
//! 每批次计算一份增量，由调用方加到唯一的持久化汇总行上

use crate::event::LedgerEvent;
use crate::types::EventKind;
use serde::{Deserialize, Serialize};

/// 单批次统计增量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDelta {
    pub tot: u64,
    pub native: u64,
    pub internal: u64,
    pub transfer: u64,
    pub nft: u64,
    pub multitoken: u64,
    pub err: u64,
    pub wallet: u64,
    pub contract: u64,
}

impl StatsDelta {
    /// 按类型计数；出错事件只计入 `err`
    pub fn from_events(events: &[LedgerEvent]) -> Self {
        let mut delta = Self::default();
        for event in events {
            if event.is_error {
                delta.err += 1;
                continue;
            }
            match event.kind {
                EventKind::Native => delta.native += 1,
                EventKind::Internal => delta.internal += 1,
                EventKind::Erc20 => delta.transfer += 1,
                EventKind::Erc721 => delta.nft += 1,
                EventKind::Erc1155 => delta.multitoken += 1,
            }
        }
        delta.tot = delta.kind_total() + delta.err;
        delta
    }

    /// 附加本批次新建的钱包 / 合约节点数
    pub fn with_nodes(mut self, wallet: u64, contract: u64) -> Self {
        self.wallet = wallet;
        self.contract = contract;
        self
    }

    fn kind_total(&self) -> u64 {
        self.native + self.internal + self.transfer + self.nft + self.multitoken
    }

    /// tot 是否等于各类型计数与出错数之和
    pub fn is_consistent(&self) -> bool {
        self.tot == self.kind_total() + self.err
    }
}

/// 持久化的统计汇总行
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub stat_tot: u64,
    pub stat_native: u64,
    pub stat_internal: u64,
    pub stat_transfer: u64,
    pub stat_nft: u64,
    pub stat_multitoken: u64,
    pub stat_err: u64,
    pub stat_wallet: u64,
    pub stat_contract: u64,
}

impl StatsSummary {
    /// 加上一份增量，从不覆盖
    pub fn merge(&mut self, delta: &StatsDelta) {
        self.stat_tot += delta.tot;
        self.stat_native += delta.native;
        self.stat_internal += delta.internal;
        self.stat_transfer += delta.transfer;
        self.stat_nft += delta.nft;
        self.stat_multitoken += delta.multitoken;
        self.stat_err += delta.err;
        self.stat_wallet += delta.wallet;
        self.stat_contract += delta.contract;
    }

    pub fn merged(mut self, delta: &StatsDelta) -> Self {
        self.merge(delta);
        self
    }

    pub fn is_consistent(&self) -> bool {
        self.stat_tot
            == self.stat_native
                + self.stat_internal
                + self.stat_transfer
                + self.stat_nft
                + self.stat_multitoken
                + self.stat_err
    }

    /// (名称, 数值) 列表，供打印
    pub fn rows(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("stat_tot", self.stat_tot),
            ("stat_native", self.stat_native),
            ("stat_internal", self.stat_internal),
            ("stat_transfer", self.stat_transfer),
            ("stat_nft", self.stat_nft),
            ("stat_multitoken", self.stat_multitoken),
            ("stat_err", self.stat_err),
            ("stat_wallet", self.stat_wallet),
            ("stat_contract", self.stat_contract),
        ]
    }
}
