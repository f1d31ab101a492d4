//! LapTrace Server binary
//!
//! Wires the analytics engine to the outside world: the background sample
//! feed on one side, the HTTP/JSON query surface on the other.

use anyhow::{Context, Result};
use laptrace_server::{api, feed, state::AppState};
use tracing_subscriber::EnvFilter;

/// Bind address, overridable with `LAPTRACE_ADDR`.
const DEFAULT_ADDR: &str = "0.0.0.0:9300";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::new();
    tokio::spawn(feed::run(state.clone()));

    let addr = std::env::var("LAPTRACE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "laptrace server listening");

    axum::serve(listener, api::create_router(state))
        .await
        .context("server exited")
}
