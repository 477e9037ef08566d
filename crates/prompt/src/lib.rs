//! Prompt system for the wellness assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering
//! - Built-in prompts with optional on-disk overrides

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{load_prompt_file, PromptLibrary, ANSWER_GENERAL, ANSWER_RESEARCH, QUERY_ENHANCE};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
