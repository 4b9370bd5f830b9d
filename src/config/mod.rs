/// Configuration management for entitykit
///
/// Holds the per-entity field tables (class name plus role -> record field name)
/// and the record store location. Field tables default to built-in values and can
/// be loaded from static JSON documents once at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Entity field tables
    pub models: ModelsConfig,
    /// Record store configuration
    pub database: DatabaseConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL for the SQLite record store (e.g. "sqlite://data/records.db")
    pub url: String,
}

/// Field table for one backend class
///
/// Document form: `{ "CLASS_NAME": "Project", "ID_FIELD": "id", "PARENT_FIELD": "parent", ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend class name (e.g. "Project")
    #[serde(rename = "CLASS_NAME")]
    pub class_name: String,
    /// Role key (e.g. "PARENT_FIELD") -> literal record field name
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

/// Field tables for every class the entities touch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub project: ModelConfig,
    pub category: ModelConfig,
    pub language: ModelConfig,
    pub user: ModelConfig,
}

/// Role keys every project table must carry
pub const PROJECT_ROLES: &[&str] = &[
    "ID_FIELD",
    "PARENT_FIELD",
    "ORIGINAL_PARENT_FIELD",
    "CATEGORY_FIELD",
    "LANGUAGE_FIELD",
    "AUTHOR_FIELD",
    "NAME_FIELD",
    "DESCRIPTION_FIELD",
    "TAGS_FIELD",
    "IS_DUBBED_FIELD",
    "IS_EDITED_FIELD",
    "RESOLUTION_X_FIELD",
    "RESOLUTION_Y_FIELD",
    "SLIDE_ORDERING_SEQUENCE_FIELD",
    "SLIDES_FIELD",
];

impl ModelConfig {
    /// Table with the given roles mapped to their snake_case default names
    pub fn with_default_fields(class_name: &str, roles: &[&str]) -> Self {
        Self {
            class_name: class_name.to_string(),
            fields: roles
                .iter()
                .map(|role| (role.to_string(), default_field_name(role)))
                .collect(),
        }
    }

    /// Record field name for a role
    ///
    /// Roles missing from the table fall back to the snake_case default
    /// ("ORIGINAL_PARENT_FIELD" -> "original_parent").
    pub fn field(&self, role: &str) -> String {
        self.fields
            .get(role)
            .cloned()
            .unwrap_or_else(|| default_field_name(role))
    }

    fn require_roles(&self, roles: &[&str]) -> Result<()> {
        let missing: Vec<&str> = roles
            .iter()
            .copied()
            .filter(|role| !self.fields.contains_key(*role))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "model config for class '{}' is missing roles: {}",
                self.class_name,
                missing.join(", ")
            );
        }
        Ok(())
    }
}

fn default_field_name(role: &str) -> String {
    role.trim_end_matches("_FIELD").to_lowercase()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            project: ModelConfig::with_default_fields("Project", PROJECT_ROLES),
            category: ModelConfig::with_default_fields("Category", &["ID_FIELD", "NAME_FIELD"]),
            language: ModelConfig::with_default_fields("Language", &["ID_FIELD", "NAME_FIELD"]),
            user: ModelConfig::with_default_fields("User", &["ID_FIELD"]),
        }
    }
}

impl ModelsConfig {
    /// Load field tables from a directory of static JSON documents
    ///
    /// Expects projectConfig.json, categoryConfig.json, languageConfig.json and
    /// userConfig.json. A missing or malformed document is a fatal error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!("📁 Loading model configs from {}", dir.display());

        let models = Self {
            project: load_model(dir, "projectConfig.json")?,
            category: load_model(dir, "categoryConfig.json")?,
            language: load_model(dir, "languageConfig.json")?,
            user: load_model(dir, "userConfig.json")?,
        };
        models.project.require_roles(PROJECT_ROLES)?;

        tracing::info!("✅ Model configs loaded (project class: {})", models.project.class_name);
        Ok(models)
    }
}

fn load_model(dir: &Path, file_name: &str) -> Result<ModelConfig> {
    let path = dir.join(file_name);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read model config '{}'", path.display()))?;
    let model: ModelConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Model config '{}' is corrupted", path.display()))?;
    Ok(model)
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            database: DatabaseConfig {
                url: std::env::var("ENTITYKIT_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/records.db".to_string()),
            },
        }
    }
}

impl Config {
    /// Default configuration, with model tables read from ENTITYKIT_MODELS_DIR when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("ENTITYKIT_MODELS_DIR") {
            config.models = ModelsConfig::load_dir(&dir)?;
        }
        Ok(config)
    }
}
