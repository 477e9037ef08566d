//! Prompt loader: built-in definitions plus optional on-disk overrides.

use crate::builder::build_prompt;
use crate::types::{BuiltPrompt, PromptDefinition};
use std::collections::HashMap;
use std::path::Path;
use wellness_core::{AppError, AppResult};

/// Prompt that turns a question into a PubMed query.
pub const QUERY_ENHANCE: &str = "query.enhance";

/// Prompt for answers grounded in retrieved articles.
pub const ANSWER_RESEARCH: &str = "answer.research";

/// Prompt for answers without retrieved articles.
pub const ANSWER_GENERAL: &str = "answer.general";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (QUERY_ENHANCE, include_str!("../prompts/query.enhance.yml")),
    (ANSWER_RESEARCH, include_str!("../prompts/answer.research.yml")),
    (ANSWER_GENERAL, include_str!("../prompts/answer.general.yml")),
];

/// The set of prompts available to the pipeline, keyed by id.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library containing only the prompts compiled into the binary.
    pub fn builtin() -> AppResult<Self> {
        let mut prompts = HashMap::new();
        for (id, source) in BUILTIN_PROMPTS {
            let definition = parse_prompt(source, id)?;
            prompts.insert(definition.id.clone(), definition);
        }
        Ok(Self { prompts })
    }

    /// Built-in prompts overlaid with every `*.yml` / `*.yaml` file in `dir`.
    ///
    /// A file whose `id` matches a built-in replaces it. `None` yields the
    /// built-in library unchanged.
    pub fn load(dir: Option<&Path>) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        let Some(dir) = dir else {
            return Ok(library);
        };

        if !dir.is_dir() {
            return Err(AppError::Prompt(format!(
                "Prompt directory not found: {:?}",
                dir
            )));
        }

        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yml") | Some("yaml")
            );
            if path.is_file() && is_yaml {
                let definition = load_prompt_file(path)?;
                tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
                library.insert(definition);
            }
        }

        Ok(library)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, definition: PromptDefinition) {
        self.prompts.insert(definition.id.clone(), definition);
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", id)))
    }

    /// Render the prompt `id` with `variables`.
    pub fn build(&self, id: &str, variables: HashMap<String, String>) -> AppResult<BuiltPrompt> {
        build_prompt(self.get(id)?, variables)
    }

    /// Sorted list of available prompt ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.prompts.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Load and validate a single prompt definition file.
pub fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    parse_prompt(&contents, &path.display().to_string())
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(temperature) = def.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Prompt(format!(
                "Prompt {} temperature out of range: {}",
                def.id, temperature
            )));
        }
    }

    Ok(())
}
