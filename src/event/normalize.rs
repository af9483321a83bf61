//! 事件规范化
//!
//! 将五类异构记录统一为 `LedgerEvent`，计算按小数位换算后的数值并按时间排序

use super::record::{ExplorerRecord, RawBatch};
use crate::config::NativeAsset;
use crate::error::{Error, Result};
use crate::types::{Address, EventKind, TokenAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 规范化后的账本事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub chain: String,
    pub kind: EventKind,
    pub hash: String,
    pub from: Address,
    pub to: Address,
    /// 原始数值；非同质化事件为 token id
    pub raw_value: TokenAmount,
    /// 换算后数值；ERC-721 恒为 1，ERC-1155 为数量
    pub converted_value: f64,
    pub token_id: Option<String>,
    pub contract_address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
    pub method_id: String,
    pub function_name: String,
}

impl LedgerEvent {
    /// 是否涉及指定地址
    pub fn touches(&self, address: &Address) -> bool {
        &self.from == address || &self.to == address
    }

    /// 函数名（去掉参数列表）
    pub fn function_base(&self) -> &str {
        self.function_name
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
    }

    pub fn has_function(&self) -> bool {
        !self.function_name.trim().is_empty()
    }

    pub fn has_value(&self) -> bool {
        !self.raw_value.is_zero()
    }

    /// 事件指纹：同一交易内类型、双方、合约与原始数额都相同即视为同一条记录
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.kind, self.hash, self.from, self.to, self.contract_address, self.raw_value
        )
    }
}

/// 事件规范化器
pub struct Normalizer<'a> {
    chain: &'a str,
    native: &'a NativeAsset,
}

impl<'a> Normalizer<'a> {
    pub fn new(chain: &'a str, native: &'a NativeAsset) -> Self {
        Self { chain, native }
    }

    /// 规范化整批记录，按时间戳稳定排序（同一时刻原生交易在前）
    pub fn normalize(&self, batch: &RawBatch) -> Result<Vec<LedgerEvent>> {
        let sources = [
            (EventKind::Native, &batch.transactions),
            (EventKind::Internal, &batch.internals),
            (EventKind::Erc20, &batch.transfers),
            (EventKind::Erc721, &batch.nfts),
            (EventKind::Erc1155, &batch.multitoken),
        ];

        let mut events = Vec::with_capacity(batch.len());
        for (kind, records) in sources {
            for record in records.iter() {
                let event = self.normalize_record(kind, record).map_err(|e| {
                    Error::NormalizeError {
                        hash: record.hash.clone(),
                        reason: e.to_string(),
                    }
                })?;
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    /// 规范化单条记录
    pub fn normalize_record(&self, kind: EventKind, record: &ExplorerRecord) -> Result<LedgerEvent> {
        let hash = record.hash.trim().to_lowercase();
        if hash.is_empty() {
            return Err(Error::NormalizeError {
                hash,
                reason: "缺少交易哈希".to_string(),
            });
        }

        let from = Address::parse(&record.from)?;
        let mut to = Address::parse(&record.to)?;
        let contract_address = Address::parse(&record.contract_address)?;
        let timestamp = parse_timestamp(&record.timestamp)?;

        let (raw_value, converted_value, token_id, symbol, name, decimals) = match kind {
            EventKind::Native | EventKind::Internal => {
                let raw = TokenAmount::from_dec_str("value", &record.value)?;
                (
                    raw,
                    raw.scaled(self.native.decimals),
                    None,
                    self.native.symbol.clone(),
                    self.native.name.clone(),
                    self.native.decimals,
                )
            }
            EventKind::Erc20 => {
                let raw = TokenAmount::from_dec_str("value", &record.value)?;
                let decimals = parse_decimals(&record.token_decimal)?;
                (
                    raw,
                    raw.scaled(decimals),
                    None,
                    record.token_symbol.clone(),
                    record.token_name.clone(),
                    decimals,
                )
            }
            EventKind::Erc721 => {
                let raw = TokenAmount::from_dec_str("tokenID", &record.token_id)?;
                (
                    raw,
                    1.0,
                    Some(raw.to_string()),
                    record.token_symbol.clone(),
                    record.token_name.clone(),
                    0,
                )
            }
            EventKind::Erc1155 => {
                let raw = TokenAmount::from_dec_str("tokenID", &record.token_id)?;
                let quantity = TokenAmount::from_dec_str("tokenValue", &record.token_value)?;
                let quantity = if quantity.is_zero() { 1.0 } else { quantity.to_f64() };
                (
                    raw,
                    quantity,
                    Some(raw.to_string()),
                    record.token_symbol.clone(),
                    record.token_name.clone(),
                    0,
                )
            }
        };

        // 合约创建交易：以新合约地址作为目标
        if kind == EventKind::Native && to.is_empty() && !contract_address.is_empty() {
            to = contract_address.clone();
        }

        let is_error = matches!(kind, EventKind::Native | EventKind::Internal)
            && record.is_error.trim() == "1";

        Ok(LedgerEvent {
            chain: self.chain.to_string(),
            kind,
            hash,
            from,
            to,
            raw_value,
            converted_value,
            token_id,
            contract_address,
            symbol,
            name,
            decimals,
            timestamp,
            is_error,
            method_id: record.method_id.clone(),
            function_name: record.function_name.clone(),
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let secs = s
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidTimestamp(s.to_string()))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| Error::InvalidTimestamp(s.to_string()))
}

fn parse_decimals(s: &str) -> Result<u32> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>().map_err(|_| Error::InvalidNumber {
        field: "tokenDecimal",
        value: s.to_string(),
    })
}
