//! Companion web server: landing page and liveness probe.
//!
//! Runs on PORT (default 5000) next to the polling bot. It is an auxiliary
//! service: if it cannot bind, the bot keeps running without it.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Landing page served at `/`
const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthStatus {
    pub const fn ok() -> Self {
        Self {
            status: "OK",
            message: "Bot is running",
        }
    }
}

/// Builds the router with `/` and `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}

/// Serves the router on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

/// Binds `addr` and serves the web server.
pub async fn start_web_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;

    log::info!("Starting web server on http://{}", addr);
    log::info!("  /        - Landing page");
    log::info!("  /health  - Health check");

    serve(listener).await
}

/// Runs the web server as a background task.
///
/// Bind and serve failures are logged and swallowed: the server is best-effort
/// and must never take the bot down with it.
pub fn spawn_web_server(addr: SocketAddr) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_web_server(addr).await {
            log::warn!("Web server on {} disabled: {}", addr, e);
        }
    })
}

/// GET / - static landing page.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - always OK, independent of the bot connection.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::ok()))
}
