//! `gemchat-server config ...` 子命令：读取、修改和检查配置文件

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;

use gemchat_config::{Config, ConfigError, ConfigManager};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// 获取配置值
    Get {
        /// 配置键 (如: server.port, llm.model)
        key: String,
    },
    /// 设置配置值并保存
    Set {
        /// 配置键 (如: server.port, llm.model)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
    /// 重新读取配置文件并验证
    Check,
}

/// 执行配置子命令，返回要打印的文本。`path` 为 None 时使用 `~/.gemchat/config.json`。
pub async fn run_config_command(
    command: ConfigCommand,
    path: Option<&Path>,
) -> anyhow::Result<String> {
    match command {
        ConfigCommand::Get { key } => {
            let manager = load_manager(path).await?;
            let config = manager.get();
            let config = config.read().await;
            let value = config
                .get_value(&key)
                .ok_or_else(|| ConfigError::KeyNotFound(key.clone()))?;
            Ok(format!("{} = {}", key, value))
        }
        ConfigCommand::Set { key, value } => {
            let manager = load_manager(path).await?;
            // 先在副本上解析，非法的键或值不会写回文件
            let mut candidate = manager.snapshot().await;
            candidate.set_value(&key, &value)?;
            manager.update(|config| *config = candidate).await?;
            Ok(format!("Set {} = {}", key, value))
        }
        ConfigCommand::Init { force } => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => ConfigManager::default_config_path()?,
            };
            if path.exists() && !force {
                return Ok(format!(
                    "Config already exists at {:?} (use --force to overwrite)",
                    path
                ));
            }
            ConfigManager::new(Config::default(), path.clone())
                .save()
                .await?;
            Ok(format!("Config initialized at {:?}", path))
        }
        ConfigCommand::Show => {
            let manager = load_manager(path).await?;
            Ok(serde_json::to_string_pretty(&manager.snapshot().await)?)
        }
        ConfigCommand::Check => {
            let manager = load_manager(path).await?;
            manager.reload().await?;
            Ok(format!("Config at {:?} is valid", manager.path()))
        }
    }
}

async fn load_manager(path: Option<&Path>) -> anyhow::Result<ConfigManager> {
    let manager = match path {
        Some(path) => ConfigManager::load(path).await,
        None => ConfigManager::load_default().await,
    };
    manager.context("Failed to load config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_then_get_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let out = run_config_command(
            ConfigCommand::Set {
                key: "server.port".to_string(),
                value: "9100".to_string(),
            },
            Some(&path),
        )
        .await
        .unwrap();
        assert_eq!(out, "Set server.port = 9100");

        let out = run_config_command(
            ConfigCommand::Get {
                key: "server.port".to_string(),
            },
            Some(&path),
        )
        .await
        .unwrap();
        assert_eq!(out, "server.port = 9100");

        let out = run_config_command(ConfigCommand::Check, Some(&path))
            .await
            .unwrap();
        assert!(out.contains("is valid"));
    }

    #[tokio::test]
    async fn test_invalid_set_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let result = run_config_command(
            ConfigCommand::Set {
                key: "server.port".to_string(),
                value: "0".to_string(),
            },
            Some(&path),
        )
        .await;
        assert!(result.is_err());

        let result = run_config_command(
            ConfigCommand::Get {
                key: "nope".to_string(),
            },
            Some(&path),
        )
        .await;
        assert!(result.is_err());

        let saved: Config =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.server.port, Config::default().server.port);
    }

    #[tokio::test]
    async fn test_init_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let out = run_config_command(ConfigCommand::Init { force: false }, Some(&path))
            .await
            .unwrap();
        assert!(out.starts_with("Config initialized"));
        assert!(path.exists());

        std::fs::write(&path, "{ broken").unwrap();
        let out = run_config_command(ConfigCommand::Init { force: false }, Some(&path))
            .await
            .unwrap();
        assert!(out.contains("already exists"));
        assert!(run_config_command(ConfigCommand::Check, Some(&path)).await.is_err());

        run_config_command(ConfigCommand::Init { force: true }, Some(&path))
            .await
            .unwrap();
        let out = run_config_command(ConfigCommand::Show, Some(&path))
            .await
            .unwrap();
        let shown: Config = serde_json::from_str(&out).unwrap();
        assert_eq!(shown.llm.model, Config::default().llm.model);
    }
}
