use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gemchat_config::LoggingConfig;

/// Send logs to a daily-rolling file next to the configured log path.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_file_logging(config: &LoggingConfig, level: &str) -> anyhow::Result<WorkerGuard> {
    let path = config
        .file
        .as_deref()
        .and_then(gemchat_config::expand_tilde)
        .or_else(gemchat_config::default_log_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine log file location"))?;

    let dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;

    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| format!("{}-tui.log", s))
        .unwrap_or_else(|| "gemchat-tui.log".to_string());

    let appender = tracing_appender::rolling::daily(&dir, prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))?;

    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
    }

    Ok(guard)
}
