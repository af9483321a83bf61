//! 事件模块
//!
//! 浏览器原始记录、规范化与按哈希分组

mod group;
mod normalize;
mod record;

pub use group::{error_count, partition, EventGroup};
pub use normalize::{LedgerEvent, Normalizer};
pub use record::{ExplorerRecord, RawBatch};
