//! # JsonFileStore Implementation
//!
//! 基于 JSON 文件的键值存储实现，每个键对应一个文件。
//!
//! 存储结构:
//! ```text
//! <base_path>/
//! ├── chatMessages.json        # 当前对话
//! └── pastChatSessions.json    # 归档会话列表
//! ```
//!
//! 写入先落到临时文件再 rename，避免中途失败留下半个文件。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::storage::KeyValueStore;

/// JsonFileStore 配置
#[derive(Debug, Clone)]
pub struct JsonFileStoreConfig {
    /// 存储根目录
    pub base_path: PathBuf,
    /// 单个值的最大字节数，None 表示不限制
    pub max_value_bytes: Option<u64>,
}

impl JsonFileStoreConfig {
    /// 创建默认配置
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            max_value_bytes: None,
        }
    }

    /// 设置单个值的大小上限
    pub fn with_max_value_bytes(mut self, limit: u64) -> Self {
        self.max_value_bytes = Some(limit);
        self
    }
}

impl Default for JsonFileStoreConfig {
    fn default() -> Self {
        Self::new(crate::default_storage_path())
    }
}

/// 文件键值存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    config: JsonFileStoreConfig,
}

impl JsonFileStore {
    /// 创建存储并确保目录存在
    pub fn new(config: JsonFileStoreConfig) -> StorageResult<Self> {
        fs::create_dir_all(&config.base_path)?;
        debug!("JsonFileStore ready at {:?}", config.base_path);
        Ok(Self { config })
    }

    /// 存储根目录
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.config.base_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;

        if let Some(limit) = self.config.max_value_bytes {
            let used = value.len() as u64;
            if used > limit {
                return Err(StorageError::QuotaExceeded { used, limit });
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
