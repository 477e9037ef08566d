//! HTTP API over the wellness pipeline.

pub mod error;
pub mod handlers;
pub mod router;

#[cfg(test)]
mod testing;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use wellness_research::WellnessPipeline;

pub use router::router;

/// Shared by every request. The pipeline keeps no per-request state.
pub struct AppState {
    pub pipeline: Arc<WellnessPipeline>,
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Wellness Chatbot API listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
