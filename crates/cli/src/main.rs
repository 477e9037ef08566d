//! Wellness CLI
//!
//! Entry point for the `wellness` binary: serves the chat API or answers a
//! single question from the terminal.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use std::path::PathBuf;
use wellness_core::{config::AppConfig, logging};

/// Wellness assistant - research-grounded answers from PubMed
#[derive(Parser, Debug)]
#[command(name = "wellness")]
#[command(about = "Research-grounded wellness answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "WELLNESS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "WELLNESS_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "WELLNESS_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP chat API
    Serve(ServeCommand),

    /// Answer one question and exit
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        Commands::Ask(_) => None,
    };

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(
        cli.provider,
        cli.model,
        bind,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::info!("Wellness CLI starting");
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
