//! # Persistence Adapter
//!
//! 键值持久化接口。会话存储只使用两个固定的键，
//! 分别保存当前对话和归档会话列表。
//!
//! 读取时，缺失或损坏的数据一律视为不存在；写入失败不致命，
//! 内存中的状态在本次运行期间仍然是权威数据。

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StorageResult;

/// 当前对话的存储键
pub const CONVERSATION_KEY: &str = "chatMessages";

/// 归档会话列表的存储键
pub const SESSIONS_KEY: &str = "pastChatSessions";

/// 基础键值存储 trait
///
/// 写入对调用方是同步的：`save` 返回时数据已经落盘（或已失败）。
pub trait KeyValueStore: Send + Sync {
    /// 读取原始字符串，不存在时返回 `None`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// 写入原始字符串（完整替换）
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// 删除键，不存在时什么都不做
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// 读取并反序列化。缺失、读取失败或内容损坏都返回 `None`。
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring corrupt data under {}: {}", key, e);
            None
        }
    }
}

/// 序列化并写入
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// 内存存储（用于测试或不需要落盘的场景）
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 键的数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
