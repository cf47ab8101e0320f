//! HTTP Server - Gemini 代理
//!
//! 只暴露两个 POST 接口和健康检查，其他方法统一返回 405。

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::method_not_allowed;
use crate::handlers::{chat_handler, health_handler, summarize_handler};
use crate::state::AppState;

/// 服务器监听配置
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 是否允许跨域
    pub cors: bool,
}

impl From<&gemchat_config::ServerConfig> for ServerSettings {
    fn from(config: &gemchat_config::ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            cors: config.cors,
        }
    }
}

/// 运行 HTTP 服务器，收到 Ctrl+C 后优雅退出
pub async fn run_server(settings: ServerSettings, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let app = create_router(state, settings.cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Gemchat proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gemchat proxy stopped");
    Ok(())
}

/// 创建路由
pub fn create_router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        // 健康检查
        .route("/health", get(health_handler))
        // 代理接口
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .route(
            "/api/summarize",
            post(summarize_handler).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http());

    let router = if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
