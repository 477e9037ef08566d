//! Serve command: run the HTTP API.

use clap::Args;
use std::sync::Arc;
use wellness_core::config::AppConfig;
use wellness_research::WellnessPipeline;

use crate::server::{self, AppState};

/// Run the chat API server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (e.g. 0.0.0.0:8000)
    #[arg(short, long, env = "WELLNESS_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let addr = config.bind_addr()?;
        let pipeline = WellnessPipeline::from_config(config)?;

        let state = Arc::new(AppState {
            pipeline: Arc::new(pipeline),
        });

        server::serve(addr, state).await
    }
}
