//! 静态地址标签（名称 + 分类），仅查询，不推导

use crate::error::{Error, Result};
use crate::types::Address;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// 外部名称与分类
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: Option<String>,
    pub categories: Vec<String>,
}

/// 标签文件中的单条记录：`{"name": "...", "labels": ["..."]}`
#[derive(Debug, Deserialize)]
struct LabelRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: Vec<String>,
}

/// 地址 -> 标签
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: IndexMap<Address, Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载，非法地址跳过
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)
            .map_err(|e| Error::ConfigError(format!("标签文件 {:?} 解析错误: {}", path, e)))?;
        debug!(path = ?path, count = table.len(), "已加载地址标签");
        Ok(table)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: IndexMap<String, LabelRecord> = serde_json::from_str(content)?;
        let mut table = Self::new();
        for (address, record) in raw {
            match Address::parse(&address) {
                Ok(address) => {
                    let name = Some(record.name).filter(|n| !n.trim().is_empty());
                    table.insert(
                        address,
                        Label {
                            name,
                            categories: record.labels,
                        },
                    );
                }
                Err(e) => warn!(address = %address, error = %e, "跳过无效的标签地址"),
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, address: Address, label: Label) {
        self.labels.insert(address, label);
    }

    pub fn get(&self, address: &Address) -> Option<&Label> {
        self.labels.get(address)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
