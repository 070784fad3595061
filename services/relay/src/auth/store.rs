//! 复制存储接入：只读 get-by-key，返回冲突 sibling 集合。

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::api::{error::AuthError, types::SiblingSet};

/// 最终一致的复制 KV 存储（只读视角）。
#[async_trait]
pub trait ReplicatedStore: Send + Sync {
    /// 读取 key；记录不存在时返回 `None`。
    async fn get(&self, key: &str) -> Result<Option<SiblingSet>, AuthError>;
}

/// 进程内存储，测试与嵌入式调用使用。
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖写入某个 key 的全部 sibling。
    pub async fn put_siblings(&self, key: impl Into<String>, siblings: Vec<String>) {
        self.records.write().await.insert(key.into(), siblings);
    }

    pub async fn remove(&self, key: &str) {
        self.records.write().await.remove(key);
    }
}

#[async_trait]
impl ReplicatedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<SiblingSet>, AuthError> {
        let guard = self.records.read().await;
        Ok(guard.get(key).cloned().map(SiblingSet::new))
    }
}

/// 文件快照存储：`{ "<key>": ["sibling", ...] }`，每次读取都重新加载。
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// 读取快照文件；文件不存在视为空存储。
fn load_snapshot(path: &Path) -> Result<HashMap<String, Vec<String>>, AuthError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read(path)
        .map_err(|err| AuthError::store(format!("read store snapshot failed: {err}")))?;
    serde_json::from_slice(&raw)
        .map_err(|err| AuthError::store(format!("decode store snapshot failed: {err}")))
}

#[async_trait]
impl ReplicatedStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<SiblingSet>, AuthError> {
        let path = self.path.clone();
        let mut snapshot = tokio::task::spawn_blocking(move || load_snapshot(&path))
            .await
            .map_err(|err| AuthError::store(format!("store snapshot task failed: {err}")))??;
        Ok(snapshot.remove(key).map(SiblingSet::new))
    }
}

/// 默认快照路径：`RELAY_STORE_PATH` 未设置时落在用户配置目录。
pub fn default_store_path(home: Option<&str>) -> PathBuf {
    let home = home.unwrap_or(".");
    PathBuf::from(home)
        .join(".config")
        .join("relaytrust")
        .join("store.json")
}
