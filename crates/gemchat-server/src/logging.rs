//! 结构化日志初始化

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化 tracing 订阅者
///
/// `level` 可以是单个级别，也可以是完整的 `EnvFilter` 指令（如 `gemchat_server=debug,tower_http=info`）。
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))?;

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_line_number(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()?;
    }

    Ok(())
}
