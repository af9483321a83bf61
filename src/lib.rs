//! ChainFlow - 链上活动分类与资产流图
//!
//! 把区块浏览器返回的异构事件归类为语义动作，并累积成持久化、去重、
//! 可增量扩展的资产流多重图：
//! - 事件规范化与按交易哈希分组
//! - 以原生交易为锚点的瀑布式规则分类
//! - 节点 / 边的幂等累积与统计汇总
//! - 按地址对重新分组的展示视图

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod graph;
pub mod reference;
pub mod stats;
pub mod storage;
pub mod types;

// 重导出常用类型
pub use classify::{Action, ClassificationRunResult, Classifier};
pub use config::EngineConfig;
pub use engine::{Investigation, InvestigationReport, Phase};
pub use error::{Error, Result};
pub use event::{EventGroup, LedgerEvent, Normalizer, RawBatch};
pub use graph::{Edge, GraphBuilder, GraphPayload, Node, PresentationEdge};
pub use reference::{AddressTag, Label, LabelTable, TagTable};
pub use stats::{StatsDelta, StatsSummary};
pub use storage::{FileStore, GraphStore, MemoryStore};
pub use types::{Address, EventKind, Fidelity, TokenAmount};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
