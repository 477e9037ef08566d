//! Shared foundation for the wellness crates.
//!
//! Holds the error type every crate returns, the layered configuration
//! (defaults, YAML file, environment, CLI flags), and tracing setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, LiteratureConfig, ServerConfig};
pub use error::{AppError, AppResult};
pub use logging::LogFormat;
