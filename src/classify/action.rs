//! 语义动作

use serde::{Deserialize, Serialize};
use std::fmt;

/// 分类得到的语义动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    // 单条原生交易
    #[serde(rename = "ether move")]
    EtherMove,
    #[serde(rename = "self deposit")]
    SelfDeposit,
    #[serde(rename = "deposit")]
    Deposit,
    #[serde(rename = "contract execution")]
    ContractExecution,
    #[serde(rename = "do nothing")]
    DoNothing,

    // 多条记录关联
    #[serde(rename = "swap token by token")]
    SwapTokenByToken,
    #[serde(rename = "buy nft with token")]
    BuyNftWithToken,
    #[serde(rename = "swap token by ether")]
    SwapTokenByEther,
    #[serde(rename = "buy nft with ether")]
    BuyNftWithEther,
    #[serde(rename = "swap token by multitoken")]
    SwapTokenByMultitoken,

    // ERC-20
    #[serde(rename = "swap ether by token")]
    SwapEtherByToken,
    #[serde(rename = "deposit token")]
    DepositToken,
    #[serde(rename = "stake token")]
    StakeToken,
    #[serde(rename = "bridge token")]
    BridgeToken,
    #[serde(rename = "add liquidity")]
    AddLiquidity,
    #[serde(rename = "burn token")]
    BurnToken,
    #[serde(rename = "mint token")]
    MintToken,
    #[serde(rename = "transfer token")]
    TransferToken,
    #[serde(rename = "withdraw token")]
    WithdrawToken,
    #[serde(rename = "transfer token to wallet")]
    TransferTokenToWallet,

    // 内部调用
    #[serde(rename = "withdraw ether")]
    WithdrawEther,
    #[serde(rename = "receive ether")]
    ReceiveEther,

    // ERC-721
    #[serde(rename = "mint nft")]
    MintNft,
    #[serde(rename = "transfer nft")]
    TransferNft,
    #[serde(rename = "burn nft")]
    BurnNft,
    #[serde(rename = "buy nft")]
    BuyNft,
    #[serde(rename = "transfer nft via operator")]
    TransferNftViaOperator,

    // ERC-1155
    #[serde(rename = "mint multitoken")]
    MintMultitoken,
    #[serde(rename = "burn multitoken")]
    BurnMultitoken,
    #[serde(rename = "buy multitoken")]
    BuyMultitoken,
    #[serde(rename = "transfer multitoken")]
    TransferMultitoken,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::EtherMove => "ether move",
            Action::SelfDeposit => "self deposit",
            Action::Deposit => "deposit",
            Action::ContractExecution => "contract execution",
            Action::DoNothing => "do nothing",
            Action::SwapTokenByToken => "swap token by token",
            Action::BuyNftWithToken => "buy nft with token",
            Action::SwapTokenByEther => "swap token by ether",
            Action::BuyNftWithEther => "buy nft with ether",
            Action::SwapTokenByMultitoken => "swap token by multitoken",
            Action::SwapEtherByToken => "swap ether by token",
            Action::DepositToken => "deposit token",
            Action::StakeToken => "stake token",
            Action::BridgeToken => "bridge token",
            Action::AddLiquidity => "add liquidity",
            Action::BurnToken => "burn token",
            Action::MintToken => "mint token",
            Action::TransferToken => "transfer token",
            Action::WithdrawToken => "withdraw token",
            Action::TransferTokenToWallet => "transfer token to wallet",
            Action::WithdrawEther => "withdraw ether",
            Action::ReceiveEther => "receive ether",
            Action::MintNft => "mint nft",
            Action::TransferNft => "transfer nft",
            Action::BurnNft => "burn nft",
            Action::BuyNft => "buy nft",
            Action::TransferNftViaOperator => "transfer nft via operator",
            Action::MintMultitoken => "mint multitoken",
            Action::BurnMultitoken => "burn multitoken",
            Action::BuyMultitoken => "buy multitoken",
            Action::TransferMultitoken => "transfer multitoken",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Action::SwapTokenByToken).unwrap();
        assert_eq!(json, "\"swap token by token\"");

        let back: Action = serde_json::from_str("\"mint nft\"").unwrap();
        assert_eq!(back, Action::MintNft);
        assert_eq!(back.to_string(), "mint nft");
    }
}
