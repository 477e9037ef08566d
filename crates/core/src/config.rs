//! Configuration management for the wellness assistant.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - A YAML config file (`--config`, `WELLNESS_CONFIG`, or `./wellness.yaml`)
//! - Environment variables (a `.env` file is loaded by the binary first)
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wellness.yaml";

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// LLM provider ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the model API key
    pub api_key_env: String,

    /// API key for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Custom LLM endpoint (provider default when unset)
    pub llm_endpoint: Option<String>,

    /// Upper bound for a single model call, in seconds
    pub llm_timeout_secs: u64,

    /// Literature search settings
    pub literature: LiteratureConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Directory with prompt overrides (`*.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// NCBI E-utilities settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteratureConfig {
    /// esearch endpoint
    pub search_url: String,

    /// efetch endpoint
    pub fetch_url: String,

    /// Base URL for article links (`<base>/<pmid>`)
    pub article_base_url: String,

    /// Environment variable holding the NCBI API key
    pub api_key_env: String,

    /// NCBI API key, attached to every request when present
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Identifiers requested per search
    pub max_results: usize,

    /// esearch timeout in seconds
    pub search_timeout_secs: u64,

    /// efetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for LiteratureConfig {
    fn default() -> Self {
        Self {
            search_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string(),
            fetch_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi".to_string(),
            article_base_url: "https://pubmed.ncbi.nlm.nih.gov".to_string(),
            api_key_env: "NCBI_API_KEY".to_string(),
            api_key: None,
            max_results: 4,
            search_timeout_secs: 10,
            fetch_timeout_secs: 15,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    literature: Option<LiteratureSection>,
    server: Option<ServerSection>,
    prompts: Option<PromptsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    endpoint: Option<String>,
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LiteratureSection {
    #[serde(rename = "searchUrl")]
    search_url: Option<String>,
    #[serde(rename = "fetchUrl")]
    fetch_url: Option<String>,
    #[serde(rename = "articleBaseUrl")]
    article_base_url: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "maxResults")]
    max_results: Option<usize>,
    #[serde(rename = "searchTimeout")]
    search_timeout: Option<u64>,
    #[serde(rename = "fetchTimeout")]
    fetch_timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptsSection {
    dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    format: Option<LogFormat>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            api_key: None,
            llm_endpoint: None,
            llm_timeout_secs: 60,
            literature: LiteratureConfig::default(),
            server: ServerConfig::default(),
            prompts_dir: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `config_file` takes precedence over `WELLNESS_CONFIG`; without either,
    /// `./wellness.yaml` is merged when it exists.
    ///
    /// Environment variables:
    /// - `WELLNESS_CONFIG`: Path to config file
    /// - `WELLNESS_PROVIDER`: LLM provider
    /// - `WELLNESS_MODEL` / `GEMINI_MODEL`: Model identifier
    /// - `WELLNESS_API_KEY` or the variable named by `apiKeyEnv` (default `GOOGLE_API_KEY`)
    /// - `WELLNESS_LLM_ENDPOINT`: Custom provider endpoint
    /// - `NCBI_API_KEY`: E-utilities API key
    /// - `WELLNESS_BIND`: Server bind address
    /// - `WELLNESS_PROMPTS_DIR`: Prompt override directory
    /// - `WELLNESS_LOG_FORMAT`: "pretty" or "json"
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use wellness_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Provider: {}", config.provider);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("WELLNESS_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(api_key_env) = llm.api_key_env {
                result.api_key_env = api_key_env;
            }
            if llm.endpoint.is_some() {
                result.llm_endpoint = llm.endpoint;
            }
            if let Some(timeout) = llm.timeout {
                result.llm_timeout_secs = timeout;
            }
        }

        if let Some(lit) = config_file.literature {
            let target = &mut result.literature;
            if let Some(url) = lit.search_url {
                target.search_url = url;
            }
            if let Some(url) = lit.fetch_url {
                target.fetch_url = url;
            }
            if let Some(url) = lit.article_base_url {
                target.article_base_url = url.trim_end_matches('/').to_string();
            }
            if let Some(env) = lit.api_key_env {
                target.api_key_env = env;
            }
            if let Some(max) = lit.max_results {
                target.max_results = max;
            }
            if let Some(timeout) = lit.search_timeout {
                target.search_timeout_secs = timeout;
            }
            if let Some(timeout) = lit.fetch_timeout {
                target.fetch_timeout_secs = timeout;
            }
        }

        if let Some(bind) = config_file.server.and_then(|s| s.bind) {
            result.server.bind = bind;
        }

        if let Some(dir) = config_file.prompts.and_then(|p| p.dir) {
            result.prompts_dir = Some(PathBuf::from(dir));
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply environment overrides through a lookup function.
    ///
    /// Taking the lookup as a closure keeps tests away from process-global
    /// environment mutation.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("WELLNESS_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("WELLNESS_MODEL").or_else(|| lookup("GEMINI_MODEL")) {
            self.model = model;
        }

        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank("WELLNESS_API_KEY").or_else(|| non_blank(&self.api_key_env)) {
            self.api_key = Some(key);
        }

        if let Some(endpoint) = lookup("WELLNESS_LLM_ENDPOINT") {
            self.llm_endpoint = Some(endpoint);
        }

        if let Some(key) = non_blank(&self.literature.api_key_env) {
            self.literature.api_key = Some(key);
        }

        if let Some(bind) = lookup("WELLNESS_BIND") {
            self.server.bind = bind;
        }

        if let Some(dir) = lookup("WELLNESS_PROMPTS_DIR") {
            self.prompts_dir = Some(PathBuf::from(dir));
        }

        if let Some(format) = lookup("WELLNESS_LOG_FORMAT").and_then(|f| LogFormat::parse(&f)) {
            self.log_format = format;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and the environment.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        bind: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> AppResult<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            AppError::Config(format!("Invalid bind address '{}': {}", self.server.bind, e))
        })
    }

    /// Validate the merged configuration.
    ///
    /// A missing model API key is not an error here: it surfaces when a
    /// model call is attempted.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model cannot be empty".to_string()));
        }

        if self.llm_timeout_secs == 0 {
            return Err(AppError::Config("LLM timeout must be positive".to_string()));
        }

        let lit = &self.literature;
        if lit.max_results == 0 || lit.max_results > 100 {
            return Err(AppError::Config(format!(
                "maxResults must be between 1 and 100, got {}",
                lit.max_results
            )));
        }

        if lit.search_timeout_secs == 0 || lit.fetch_timeout_secs == 0 {
            return Err(AppError::Config(
                "Literature timeouts must be positive".to_string(),
            ));
        }

        self.bind_addr()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.0-flash-exp");
        assert_eq!(config.literature.max_results, 4);
        assert_eq!(config.literature.search_timeout_secs, 10);
        assert_eq!(config.literature.fetch_timeout_secs, 15);
        assert_eq!(config.llm_timeout_secs, 60);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wellness.yaml");
        fs::write(
            &path,
            r#"
llm:
  provider: ollama
  model: llama3.2
  endpoint: http://localhost:11434
  timeout: 30
literature:
  maxResults: 6
  articleBaseUrl: https://example.org/pubmed/
server:
  bind: 127.0.0.1:9000
prompts:
  dir: ./prompts
logging:
  level: debug
  format: json
  color: false
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.llm_endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.llm_timeout_secs, 30);
        assert_eq!(config.literature.max_results, 6);
        assert_eq!(config.literature.article_base_url, "https://example.org/pubmed");
        assert_eq!(config.literature.fetch_timeout_secs, 15);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.prompts_dir, Some(PathBuf::from("./prompts")));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.no_color);
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        fs::write(&path, "llm: [unterminated").unwrap();

        assert!(AppConfig::default().merge_yaml(&path).is_err());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_apply_env() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("GOOGLE_API_KEY", "secret"),
            ("NCBI_API_KEY", "ncbi-secret"),
            ("WELLNESS_BIND", "127.0.0.1:8080"),
            ("NO_COLOR", "1"),
        ]));

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.literature.api_key.as_deref(), Some("ncbi-secret"));
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.no_color);
    }

    #[test]
    fn test_apply_env_precedence() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("WELLNESS_MODEL", "explicit"),
            ("GEMINI_MODEL", "ignored"),
            ("WELLNESS_API_KEY", "primary"),
            ("GOOGLE_API_KEY", "secondary"),
        ]));

        assert_eq!(config.model, "explicit");
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_apply_env_ignores_blank_keys() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("GOOGLE_API_KEY", "  "), ("NCBI_API_KEY", "")]));

        assert!(config.api_key.is_none());
        assert!(config.literature.api_key.is_none());
    }

    #[test]
    fn test_blank_primary_key_falls_back() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("WELLNESS_API_KEY", ""), ("GOOGLE_API_KEY", "g-key")]));

        assert_eq!(config.api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn test_custom_api_key_env() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wellness.yaml");
        fs::write(&path, "llm:\n  apiKeyEnv: MY_MODEL_KEY\n").unwrap();

        let mut config = AppConfig::default().merge_yaml(&path).unwrap();
        config.apply_env(env_of(&[("MY_MODEL_KEY", "k"), ("GOOGLE_API_KEY", "other")]));
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            Some("127.0.0.1:3000".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert_eq!(overridden.server.bind, "127.0.0.1:3000");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = AppConfig::default();
        config.literature.max_results = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.llm_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.literature.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_bind() {
        let mut config = AppConfig::default();
        config.server.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_without_api_key() {
        let config = AppConfig::default();
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }
}
