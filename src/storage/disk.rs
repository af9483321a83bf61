//! 快照文件存储
//!
//! 整个存储状态序列化为一个快照文件：
//! 头部（魔数、版本、CRC32、载荷长度）+ LZ4 压缩的 bincode 载荷。
//! 每次提交先写临时文件再原子替换，失败时已有快照保持不变。

use super::memory::MemoryStore;
use super::{CommitReport, GraphStore, StoreState};
use crate::error::{Error, Result};
use crate::graph::{Edge, GraphDelta, LinkKey, Node};
use crate::reference::TagTable;
use crate::stats::StatsSummary;
use crate::types::Address;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 快照文件名
const SNAPSHOT_FILE: &str = "graph.cfs"; // ChainFlow Snapshot
/// 文件魔数
const MAGIC_NUMBER: u64 = 0x4348_4149_4E46_4C57; // "CHAINFLW"
/// 文件版本
const FILE_VERSION: u32 = 2;
/// 头部长度
const HEADER_SIZE: usize = 24;

/// 快照头部
#[derive(Debug, PartialEq)]
struct SnapshotHeader {
    magic: u64,
    version: u32,
    checksum: u32,
    payload_len: u64,
}

impl SnapshotHeader {
    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.magic.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::StorageError("快照头部数据不足".to_string()));
        }
        let magic = read_u64(bytes, 0);
        if magic != MAGIC_NUMBER {
            return Err(Error::StorageError("无效的快照文件格式".to_string()));
        }
        let version = read_u32(bytes, 8);
        if version != FILE_VERSION {
            return Err(Error::StorageError(format!(
                "不支持的快照版本: {} (当前 {})",
                version, FILE_VERSION
            )));
        }
        Ok(Self {
            magic,
            version,
            checksum: read_u32(bytes, 12),
            payload_len: read_u64(bytes, 16),
        })
    }
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

/// 编码存储状态
fn encode(state: &StoreState) -> Result<Vec<u8>> {
    let raw = bincode::serialize(state)?;
    let payload = compress_prepend_size(&raw);
    let header = SnapshotHeader {
        magic: MAGIC_NUMBER,
        version: FILE_VERSION,
        checksum: crc32fast::hash(&payload),
        payload_len: payload.len() as u64,
    };

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// 解码并校验
fn decode(bytes: &[u8]) -> Result<StoreState> {
    let header = SnapshotHeader::from_bytes(bytes)?;
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() as u64 != header.payload_len {
        return Err(Error::StorageError(format!(
            "快照载荷长度不符: 期望 {}, 实际 {}",
            header.payload_len,
            payload.len()
        )));
    }

    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(Error::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let raw = decompress_size_prepended(payload)
        .map_err(|e| Error::StorageError(format!("解压失败: {}", e)))?;
    Ok(bincode::deserialize(&raw)?)
}

/// 快照文件存储
pub struct FileStore {
    /// 数据目录
    data_dir: PathBuf,
    /// 快照路径
    path: PathBuf,
    /// 内存中的当前状态
    inner: MemoryStore,
    /// 串行化提交
    commit_lock: Mutex<()>,
}

impl FileStore {
    /// 打开或创建存储
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(SNAPSHOT_FILE);
        let state = if path.exists() {
            let bytes = fs::read(&path)?;
            let state = decode(&bytes)?;
            info!(
                path = ?path,
                nodes = state.nodes.len(),
                edges = state.edges.len(),
                "已加载快照"
            );
            state
        } else {
            debug!(path = ?path, "快照不存在，使用空状态");
            StoreState::default()
        };

        Ok(Self {
            data_dir,
            path,
            inner: MemoryStore::from_state(state),
            commit_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    /// 写临时文件后改名
    fn write_snapshot(&self, state: &StoreState) -> Result<()> {
        let bytes = encode(state)?;
        let tmp_path = self.path.with_extension("cfs.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = ?self.path, bytes = bytes.len(), "快照已写入");
        Ok(())
    }
}

impl GraphStore for FileStore {
    fn contains_node(&self, id: &Address) -> bool {
        self.inner.contains_node(id)
    }

    fn node(&self, id: &Address) -> Option<Node> {
        self.inner.node(id)
    }

    fn nodes(&self) -> Vec<Node> {
        self.inner.nodes()
    }

    fn edge(&self, key: &LinkKey) -> Option<Edge> {
        self.inner.edge(key)
    }

    fn edges(&self) -> Vec<Edge> {
        self.inner.edges()
    }

    fn stats(&self) -> StatsSummary {
        self.inner.stats()
    }

    fn tags(&self) -> TagTable {
        self.inner.tags()
    }

    fn is_processed(&self, hash: &str) -> bool {
        self.inner.is_processed(hash)
    }

    fn is_counted(&self, fingerprint: &str) -> bool {
        self.inner.is_counted(fingerprint)
    }

    fn commit(&self, delta: GraphDelta) -> Result<CommitReport> {
        let _guard = self.commit_lock.lock();
        let mut next = self.inner.snapshot();
        let report = next.apply(delta);
        self.write_snapshot(&next)?;
        self.inner.replace(next);
        Ok(report)
    }

    fn reset(&self) -> Result<()> {
        let _guard = self.commit_lock.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        self.inner.replace(StoreState::default());
        info!(path = ?self.path, "存储已重置");
        Ok(())
    }
}
