use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gemchat_config::{Config, ConfigManager, StorageConfig};
use gemchat_core::{
    ConversationService, JsonFileStore, JsonFileStoreConfig, SharedSessionStore,
    SummarizationService,
};
use gemchat_llm::{GeminiChat, GeminiProvider, LLMProvider, ProviderConfig};

mod app;
mod client;
mod logging;
mod ui;

use app::{App, ConnectionStatus, Focus};
use client::ProxyClient;

#[derive(Parser, Debug)]
#[command(name = "gemchat-tui")]
#[command(about = "Terminal chat client for Gemini")]
#[command(version)]
struct Cli {
    /// Proxy server URL (overrides config)
    #[arg(long, env = "GEMCHAT_PROXY_URL")]
    server: Option<String>,

    /// Talk to Gemini directly instead of going through the proxy
    #[arg(long, default_value = "false")]
    direct: bool,

    /// Gemini API key for --direct (defaults to the variable named by llm.api_key_env)
    #[arg(long)]
    api_key: Option<String>,

    /// Gemini model for --direct (overrides config)
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Directory holding the persisted conversation and sessions
    #[arg(long, env = "GEMCHAT_DATA_DIR")]
    data_dir: Option<String>,

    /// Log level or filter directives (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Config file path
    #[arg(long, env = "GEMCHAT_CONFIG", default_value = "~/.gemchat/config.json")]
    config: String,
}

struct Services {
    conversation: Arc<dyn ConversationService>,
    summarizer: Arc<dyn SummarizationService>,
    status: ConnectionStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = gemchat_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));
    let config = ConfigManager::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {:?}", config_path))?
        .snapshot()
        .await;

    // 终端被界面占用，日志只写文件
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.as_str().to_string());
    let _log_guard = logging::init_file_logging(&config.logging, &level)?;

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.storage.path.clone())
        .and_then(|p| gemchat_config::expand_tilde(&p))
        .unwrap_or_else(gemchat_core::default_storage_path);
    let storage = JsonFileStore::new(storage_config(&data_dir, &config.storage))
        .with_context(|| format!("Failed to open data directory {:?}", data_dir))?;
    let store = SharedSessionStore::load(Arc::new(storage));

    let services = build_services(&cli, &config).await?;
    tracing::info!(
        "Starting gemchat-tui (data: {:?}, status: {})",
        data_dir,
        services.status
    );

    let mut app = App::new(
        store,
        services.conversation,
        services.summarizer,
        services.status,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Terminal loop failed: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn storage_config(data_dir: &Path, storage: &StorageConfig) -> JsonFileStoreConfig {
    let store_config = JsonFileStoreConfig::new(data_dir);
    match storage.max_value_bytes {
        Some(limit) => store_config.with_max_value_bytes(limit),
        None => store_config,
    }
}

async fn build_services(cli: &Cli, config: &Config) -> anyhow::Result<Services> {
    if cli.direct {
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| config.llm.api_key())
            .with_context(|| {
                format!(
                    "No Gemini API key: pass --api-key or set {}",
                    config.llm.api_key_env
                )
            })?;
        let provider_config = ProviderConfig::new("gemini", config.llm.base_url.clone())
            .with_model(cli.model.clone().unwrap_or_else(|| config.llm.model.clone()))
            .with_timeout(Duration::from_secs(config.llm.timeout_seconds))
            .with_api_key(api_key);
        let provider = GeminiProvider::with_config(provider_config)?;
        provider.validate().await?;

        let chat = Arc::new(GeminiChat::new(Arc::new(provider)));
        return Ok(Services {
            conversation: chat.clone(),
            summarizer: chat,
            status: ConnectionStatus::Direct,
        });
    }

    let url = cli
        .server
        .clone()
        .unwrap_or_else(|| config.client.proxy_url.clone());
    let client = Arc::new(ProxyClient::new(
        &url,
        Duration::from_secs(config.client.timeout_seconds),
    )?);

    let status = if client.health_check().await {
        ConnectionStatus::Connected
    } else {
        tracing::warn!("Proxy at {} is not reachable", client.base_url());
        ConnectionStatus::Disconnected
    };

    Ok(Services {
        conversation: client.clone(),
        summarizer: client,
        status,
    })
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = tokio::time::Instant::now();
    let tick_rate = tokio::time::Duration::from_millis(100);

    loop {
        // Draw UI
        terminal.draw(|f| ui::draw(f, app))?;

        // Handle timeout for event polling
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| tokio::time::Duration::from_secs(0));

        // Poll in a blocking section so spawned network tasks keep running
        let event = tokio::task::block_in_place(|| -> io::Result<Option<Event>> {
            if crossterm::event::poll(timeout)? {
                Ok(Some(crossterm::event::read()?))
            } else {
                Ok(None)
            }
        })?;

        if let Some(Event::Key(key)) = event {
            if key.kind == KeyEventKind::Press && handle_key_event(app, key) {
                return Ok(());
            }
        }

        // Apply store notifications
        app.process_events();

        // Update on tick
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = tokio::time::Instant::now();
        }
    }
}

/// Returns `true` when the app should quit
fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return true,
        KeyCode::Char('n') if ctrl => {
            app.new_session();
            return false;
        }
        KeyCode::Char('b') if ctrl => {
            app.toggle_sidebar();
            return false;
        }
        KeyCode::PageUp => {
            app.scroll_up(10);
            return false;
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            return false;
        }
        _ => {}
    }

    match app.focus {
        Focus::Sidebar => match key.code {
            KeyCode::Up => app.select_prev(),
            KeyCode::Down => app.select_next(),
            KeyCode::Enter => app.activate_selected(),
            KeyCode::Delete | KeyCode::Char('d') => app.delete_selected(),
            KeyCode::Esc => app.toggle_sidebar(),
            _ => {}
        },
        Focus::Input => match key.code {
            KeyCode::Enter => app.send_message(),
            KeyCode::Char(c) if !ctrl => app.push_input(c),
            KeyCode::Backspace => app.pop_input(),
            KeyCode::Up => app.scroll_up(1),
            KeyCode::Down => app.scroll_down(1),
            _ => {}
        },
    }
    false
}
