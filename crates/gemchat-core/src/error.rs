//! # Error Types
//!
//! 定义持久化与外部服务调用相关的错误类型。
//!
//! 这些错误都不会传递到界面层：存储错误只记录日志，
//! 服务错误会被转换成对话中的占位消息或备用标题。

use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 非法的存储键
    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    /// 存储已满
    #[error("Storage quota exceeded: {used}/{limit}")]
    QuotaExceeded { used: u64, limit: u64 },

    /// 其他错误
    #[error("Storage error: {message}")]
    Other { message: String },
}

impl StorageError {
    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// 存储结果类型
pub type StorageResult<T> = Result<T, StorageError>;

/// 外部服务（对话 / 摘要）调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// 网络错误
    #[error("network error: {0}")]
    Network(String),

    /// 非 2xx 响应
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 响应体无法解析
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// 服务调用结果类型
pub type ServiceResult<T> = Result<T, ServiceError>;
