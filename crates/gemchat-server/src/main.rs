use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gemchat_config::ConfigManager;
use gemchat_llm::{GeminiProvider, LLMProvider, ProviderConfig};
use gemchat_server::config_cmd::{run_config_command, ConfigCommand};
use gemchat_server::{logging::init_logging, run_server, AppState, ServerSettings};

#[derive(Parser, Debug, Clone)]
#[command(name = "gemchat-server")]
#[command(about = "Gemchat proxy server for Gemini chat and titling")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Server host (overrides config)
    #[arg(long, env = "GEMCHAT_HOST")]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Gemini API base URL (overrides config)
    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    /// Gemini model name (overrides config)
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Gemini API key (defaults to the variable named by llm.api_key_env)
    #[arg(long)]
    api_key: Option<String>,

    /// Log level or filter directives (overrides config)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    json_logs: bool,

    /// Config file path (defaults to ~/.gemchat/config.json)
    #[arg(long, env = "GEMCHAT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// 启动代理服务（默认）
    Serve,
    /// 配置管理命令
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 展开配置文件路径
    let config_path = cli.config.as_deref().map(|path| {
        gemchat_config::expand_tilde(path).unwrap_or_else(|| std::path::PathBuf::from(path))
    });

    if let Some(Command::Config { command }) = cli.command.clone() {
        println!("{}", run_config_command(command, config_path.as_deref()).await?);
        return Ok(());
    }

    if let Err(e) = gemchat_config::init_gemchat_dirs().await {
        eprintln!("Warning: Failed to init gemchat directories: {}", e);
    }

    let config_manager = match &config_path {
        Some(path) => ConfigManager::load(path).await,
        None => ConfigManager::load_default().await,
    }
    .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let config = config_manager.snapshot().await;

    // 初始化日志
    let log_level = cli.log_level.clone().unwrap_or_else(|| {
        if cli.debug {
            "debug".to_string()
        } else {
            config.logging.level.as_str().to_string()
        }
    });
    init_logging(&log_level, cli.json_logs || config.logging.json)?;

    // 确定最终配置值（CLI 参数覆盖配置文件）
    let mut settings = ServerSettings::from(&config.server);
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let api_key = cli
        .api_key
        .or_else(|| config.llm.api_key())
        .with_context(|| {
            format!(
                "No Gemini API key: pass --api-key or set {}",
                config.llm.api_key_env
            )
        })?;

    let provider_config = ProviderConfig::new("gemini", cli.base_url.unwrap_or(config.llm.base_url))
        .with_model(cli.model.unwrap_or(config.llm.model))
        .with_timeout(Duration::from_secs(config.llm.timeout_seconds))
        .with_api_key(api_key);

    tracing::info!("Starting Gemchat proxy on {}:{}", settings.host, settings.port);
    tracing::info!("  Config: {:?}", config_manager.path());
    tracing::info!("  Base URL: {}", provider_config.base_url);
    tracing::info!("  Model: {}", provider_config.model);
    tracing::debug!("  CORS: {}", settings.cors);

    let provider = GeminiProvider::with_config(provider_config)?;
    provider.validate().await?;

    let state = AppState::new(Arc::new(provider));
    run_server(settings, state).await
}
