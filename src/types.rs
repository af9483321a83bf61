//! Web3 特定类型和通用类型定义

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 零地址（铸造来源 / 销毁目标）
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// 以太坊地址（小写十六进制字符串，允许为空：合约创建交易的 `to`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// 解析并规范化地址
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Ok(Address(s));
        }
        let hex_part = s.strip_prefix("0x").unwrap_or(&s);
        let bytes =
            hex::decode(hex_part).map_err(|e| crate::Error::InvalidAddress(format!("{}: {}", s, e)))?;
        if bytes.len() != 20 {
            return Err(crate::Error::InvalidAddress(format!(
                "地址长度应为 20 字节, 实际为 {} 字节: {}",
                bytes.len(),
                s
            )));
        }
        Ok(Address(format!("0x{}", hex_part)))
    }

    /// 零地址
    pub fn zero() -> Self {
        Address(ZERO_ADDRESS.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 代币原始数量 (256位大整数)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    pub fn from_u64(v: u64) -> Self {
        TokenAmount(U256::from(v))
    }

    /// 解析十进制字符串，空串视为 0
    pub fn from_dec_str(field: &'static str, s: &str) -> Result<Self, crate::Error> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(TokenAmount::default());
        }
        U256::from_dec_str(s)
            .map(TokenAmount)
            .map_err(|_| crate::Error::InvalidNumber {
                field,
                value: s.to_string(),
            })
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// 转换为 f64（大数会损失精度，仅用于展示和累加）
    pub fn to_f64(&self) -> f64 {
        // 低位在前的 4 个 u64 limb
        let limbs = self.0 .0;
        limbs
            .iter()
            .rev()
            .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
    }

    /// 按小数位换算后的数值
    pub fn scaled(&self, decimals: u32) -> f64 {
        self.to_f64() / 10f64.powi(decimals as i32)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 账本事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// 原生交易
    Native,
    /// 内部调用
    Internal,
    /// ERC-20 转账
    Erc20,
    /// ERC-721 转账
    Erc721,
    /// ERC-1155 转账
    Erc1155,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Native => "native",
            EventKind::Internal => "internal",
            EventKind::Erc20 => "transfer",
            EventKind::Erc721 => "nft",
            EventKind::Erc1155 => "multitoken",
        }
    }

    /// 是否为非同质化资产（边键需要携带 token id）
    pub fn is_non_fungible(&self) -> bool {
        matches!(self, EventKind::Erc721 | EventKind::Erc1155)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图构建精度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// 分组 + 规则分类
    #[default]
    Detailed,
    /// 逐条事件直连，不分类
    Linear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        let addr = Address::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f5bB01").unwrap();
        assert_eq!(addr.as_str(), "0x742d35cc6634c0532925a3b844bc9e7595f5bb01");

        let bare = Address::parse("742d35Cc6634C0532925a3b844Bc9e7595f5bB01").unwrap();
        assert_eq!(addr, bare);

        assert!(Address::parse("").unwrap().is_empty());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzz2d35Cc6634C0532925a3b844Bc9e7595f5bB01").is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::parse(ZERO_ADDRESS).unwrap().is_zero());
        assert!(Address::zero().is_zero());
    }

    #[test]
    fn test_token_amount_scaling() {
        let wei = TokenAmount::from_dec_str("value", "1500000000000000000").unwrap();
        assert!((wei.scaled(18) - 1.5).abs() < 1e-12);

        let usdc = TokenAmount::from_dec_str("value", "2500000").unwrap();
        assert!((usdc.scaled(6) - 2.5).abs() < 1e-12);

        assert!(TokenAmount::from_dec_str("value", "").unwrap().is_zero());
        assert!(TokenAmount::from_dec_str("value", "12ab").is_err());
    }

    #[test]
    fn test_token_amount_beyond_u128() {
        // 2^130
        let big = TokenAmount(U256::one() << 130);
        let expected = 2f64.powi(130);
        assert!((big.to_f64() - expected).abs() / expected < 1e-12);
    }
}
