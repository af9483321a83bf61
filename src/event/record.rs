//! 区块浏览器原始记录
//!
//! 字段命名与 Etherscan 风格 API 返回一致，所有值均为字符串

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 单条浏览器记录（五类接口共用，缺失字段为空串）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExplorerRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub token_value: String,
    pub contract_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub token_decimal: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    pub is_error: String,
    pub method_id: String,
    pub function_name: String,
}

/// 一次地址抓取得到的五类记录集合
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBatch {
    /// 原生交易
    pub transactions: Vec<ExplorerRecord>,
    /// 内部调用
    pub internals: Vec<ExplorerRecord>,
    /// ERC-20 转账
    pub transfers: Vec<ExplorerRecord>,
    /// ERC-721 转账
    pub nfts: Vec<ExplorerRecord>,
    /// ERC-1155 转账
    pub multitoken: Vec<ExplorerRecord>,
}

impl RawBatch {
    /// 从 JSON 文件加载
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::SerializationError(format!("批次文件 {:?} 解析错误: {}", path, e)))
    }

    /// 记录总数
    pub fn len(&self) -> usize {
        self.transactions.len()
            + self.internals.len()
            + self.transfers.len()
            + self.nfts.len()
            + self.multitoken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_etherscan_fields() {
        let json = r#"{
            "transfers": [{
                "hash": "0xabc",
                "from": "0x742d35cc6634c0532925a3b844bc9e7595f5bb01",
                "to": "0x8ba1f109551bd432803012645ac136ddd64dba72",
                "value": "2500000",
                "contractAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "tokenName": "USD Coin",
                "tokenSymbol": "USDC",
                "tokenDecimal": "6",
                "timeStamp": "1700000000",
                "gasUsed": "51000"
            }],
            "nfts": [{ "hash": "0xdef", "tokenID": "7" }]
        }"#;

        let batch: RawBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.transactions.is_empty());

        let t = &batch.transfers[0];
        assert_eq!(t.token_symbol, "USDC");
        assert_eq!(t.token_decimal, "6");
        assert_eq!(t.timestamp, "1700000000");
        assert_eq!(t.is_error, "");
        assert_eq!(batch.nfts[0].token_id, "7");
    }
}
