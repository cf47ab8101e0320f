pub mod config;
pub mod manager;

pub use config::{
    ClientConfig, Config, ConfigError, ConfigResult, LlmConfig, LogLevel, LoggingConfig,
    ServerConfig, StorageConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Gemchat 配置目录路径
pub fn gemchat_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gemchat"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    gemchat_dir().map(|dir| dir.join("config.json"))
}

/// 获取默认日志文件路径
pub fn default_log_path() -> Option<PathBuf> {
    gemchat_dir().map(|dir| dir.join("logs").join("gemchat.log"))
}

/// 初始化 Gemchat 目录结构
pub async fn init_gemchat_dirs() -> ConfigResult<()> {
    if let Some(root) = gemchat_dir() {
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join("data")).await?;
        tokio::fs::create_dir_all(root.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemchat_dir() {
        let dir = gemchat_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".gemchat"));
    }

    #[test]
    fn test_default_paths_live_under_gemchat_dir() {
        let root = gemchat_dir().unwrap();
        assert!(default_config_path().unwrap().starts_with(&root));
        assert!(default_log_path().unwrap().starts_with(&root));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.gemchat/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with("~"));

        assert_eq!(expand_tilde("/tmp/x"), Some(PathBuf::from("/tmp/x")));
    }
}
