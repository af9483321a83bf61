//! 引擎配置

use crate::error::{Error, Result};
use crate::types::Fidelity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 原生资产描述（原生交易与内部调用统一使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeAsset {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
}

impl Default for NativeAsset {
    fn default() -> Self {
        Self {
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 链标识
    pub chain: String,
    /// 原生资产
    pub native: NativeAsset,
    /// 数据目录
    pub data_dir: PathBuf,
    /// 构图精度
    pub fidelity: Fidelity,
    /// 地址标签文件（可选）
    pub labels_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain: "eth".to_string(),
            native: NativeAsset::default(),
            data_dir: PathBuf::from("./data"),
            fidelity: Fidelity::Detailed,
            labels_path: None,
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载，缺省字段取默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("无法读取配置 {:?}: {}", path, e)))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("配置格式错误 {:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.trim().is_empty() {
            return Err(Error::ConfigError("chain 不能为空".to_string()));
        }
        if self.native.symbol.trim().is_empty() {
            return Err(Error::ConfigError("native.symbol 不能为空".to_string()));
        }
        Ok(())
    }
}
