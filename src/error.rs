//! 错误类型定义

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("无效的地址格式: {0}")]
    InvalidAddress(String),

    #[error("无效的数值 {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("无效的时间戳: {0}")]
    InvalidTimestamp(String),

    #[error("规范化错误 (hash {hash}): {reason}")]
    NormalizeError { hash: String, reason: String },

    #[error("存储错误: {0}")]
    StorageError(String),

    #[error("数据校验失败: 期望 CRC {expected}, 实际 {actual}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
