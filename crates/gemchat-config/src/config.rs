use serde::{Deserialize, Serialize};

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub client: ClientConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            client: ClientConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "cors"] => Some(self.server.cors.to_string()),
            ["llm", "base_url"] => Some(self.llm.base_url.clone()),
            ["llm", "model"] => Some(self.llm.model.clone()),
            ["llm", "api_key_env"] => Some(self.llm.api_key_env.clone()),
            ["llm", "timeout_seconds"] => Some(self.llm.timeout_seconds.to_string()),
            ["client", "proxy_url"] => Some(self.client.proxy_url.clone()),
            ["client", "timeout_seconds"] => Some(self.client.timeout_seconds.to_string()),
            ["storage", "path"] => self.storage.path.clone(),
            ["storage", "max_value_bytes"] => {
                self.storage.max_value_bytes.map(|n| n.to_string())
            }
            ["logging", "level"] => Some(self.logging.level.as_str().to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["server", "port"] => {
                self.server.port = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid port number: {}", value))
                })?;
            }
            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "cors"] => {
                self.server.cors = parse_bool(value)?;
            }
            ["llm", "base_url"] => {
                self.llm.base_url = value.to_string();
            }
            ["llm", "model"] => {
                self.llm.model = value.to_string();
            }
            ["llm", "api_key_env"] => {
                self.llm.api_key_env = value.to_string();
            }
            ["llm", "timeout_seconds"] => {
                self.llm.timeout_seconds = parse_number(value)?;
            }
            ["client", "proxy_url"] => {
                self.client.proxy_url = value.to_string();
            }
            ["client", "timeout_seconds"] => {
                self.client.timeout_seconds = parse_number(value)?;
            }
            ["storage", "path"] => {
                self.storage.path = Some(value.to_string());
            }
            ["storage", "max_value_bytes"] => {
                self.storage.max_value_bytes = Some(parse_number(value)?);
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json"] => {
                self.logging.json = parse_bool(value)?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

fn parse_number(value: &str) -> ConfigResult<u64> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

/// Server 配置（代理服务）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            host: "127.0.0.1".to_string(),
            cors: true,
        }
    }
}

/// LLM 配置
///
/// API key 不写入配置文件，只记录读取它的环境变量名。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl LlmConfig {
    /// 从环境变量读取 API key（空值视为未设置）
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// 终端客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// 代理服务地址
    pub proxy_url: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8081".to_string(),
            timeout_seconds: 90,
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub path: Option<String>,
    /// 单个键的大小上限（字节），不设置表示不限制
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Some("~/.gemchat/data".to_string()),
            max_value_bytes: None,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// 作为 `EnvFilter` 指令使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// 日志文件路径；终端客户端总是写文件
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.gemchat/logs/gemchat.log".to_string()),
            json: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_get_and_set_value() {
        let mut config = Config::default();

        config.set_value("server.port", "9000").unwrap();
        config.set_value("llm.model", "gemini-1.5-pro").unwrap();
        config.set_value("logging.level", "WARNING").unwrap();
        config.set_value("logging.json", "true").unwrap();

        assert_eq!(config.get_value("server.port").as_deref(), Some("9000"));
        assert_eq!(config.get_value("llm.model").as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.get_value("logging.level").as_deref(), Some("warn"));
        assert_eq!(config.get_value("logging.json").as_deref(), Some("true"));
        assert_eq!(config.get_value("llm.api_key"), None);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_value("server.port", "abc"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("server.cors", "maybe"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("nope.key", "1"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_missing_client_section_uses_default() {
        let mut value = serde_json::to_value(Config::default()).unwrap();
        value.as_object_mut().unwrap().remove("client");
        let config: Config = serde_json::from_value(value).unwrap();
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn test_storage_quota_is_optional() {
        let mut config = Config::default();
        assert_eq!(config.get_value("storage.max_value_bytes"), None);

        let value = serde_json::to_value(&config).unwrap();
        assert!(value["storage"].get("max_value_bytes").is_none());

        config.set_value("storage.max_value_bytes", "4096").unwrap();
        assert_eq!(config.storage.max_value_bytes, Some(4096));
        assert_eq!(
            config.get_value("storage.max_value_bytes").as_deref(),
            Some("4096")
        );
        assert!(config.set_value("storage.max_value_bytes", "lots").is_err());
    }

    #[test]
    fn test_api_key_from_env() {
        let mut llm = LlmConfig::default();
        llm.api_key_env = "GEMCHAT_CONFIG_TEST_KEY".to_string();

        std::env::remove_var("GEMCHAT_CONFIG_TEST_KEY");
        assert!(llm.api_key().is_none());

        std::env::set_var("GEMCHAT_CONFIG_TEST_KEY", "abc");
        assert_eq!(llm.api_key().as_deref(), Some("abc"));
        std::env::remove_var("GEMCHAT_CONFIG_TEST_KEY");
    }
}
