use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::database::connection::DatabaseConnection;
use crate::database::definitions::{ACTIVE_KEY, LOCALE_KEY, ModelDefinition, ModelRegistry, TranslationModel};
use crate::database::schema::TIMESTAMP_COLUMNS;
use crate::errors::ConfigError;
use crate::language_utils::LabelStyle;
use crate::locale::{LocaleConfig, LocaleRegistry};

/// Application configuration module
/// This module handles loading and validating the JSON configuration:
/// locale settings, the models to serve and where the database lives.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Locale list and fallback settings
    #[serde(default)]
    pub locales: LocaleConfig,

    /// SQLite database file; the user data directory when absent
    #[serde(default)]
    pub database_path: Option<String>,

    /// Models backed by the database
    #[serde(default)]
    pub models: Vec<ModelConfig>,

    /// How locale labels are written
    #[serde(default)]
    pub labels: LabelConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// A model as declared in the configuration file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    /// Type tag
    pub name: String,

    /// Base table; defaults to the type tag
    #[serde(default)]
    pub table: Option<String>,

    /// Non-translatable columns
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Translatable columns; a model with none has no translations
    #[serde(default)]
    pub translated_attributes: Vec<String>,

    /// Translation table, when it does not follow the naming convention
    #[serde(default)]
    pub translation_table: Option<String>,

    /// Foreign key column, when it does not follow the naming convention
    #[serde(default)]
    pub foreign_key: Option<String>,
}

impl ModelConfig {
    fn is_translatable(&self) -> bool {
        !self.translated_attributes.is_empty() || self.translation_table.is_some()
    }

    /// Build the model definition this entry describes
    pub fn to_definition(&self) -> ModelDefinition {
        let table = self.table.clone().unwrap_or_else(|| self.name.clone());
        let definition = ModelDefinition::new(self.name.clone(), table.clone(), self.attributes.clone());

        if !self.is_translatable() {
            return definition;
        }

        let mut translation =
            TranslationModel::conventional(&table, self.translated_attributes.clone());
        if let Some(name) = &self.translation_table {
            translation.table = name.clone();
        }
        if let Some(key) = &self.foreign_key {
            translation.foreign_key = key.clone();
        }

        definition.translatable(translation)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidModel {
            model: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("model name is empty".to_string()));
        }

        let definition = self.to_definition();
        let base_reserved = [definition.key_name.as_str(), TIMESTAMP_COLUMNS[0], TIMESTAMP_COLUMNS[1]];

        let mut seen = HashSet::new();
        for name in &self.attributes {
            if base_reserved.contains(&name.as_str()) || !seen.insert(name.as_str()) {
                return Err(invalid(format!("attribute '{}' is reserved or repeated", name)));
            }
        }

        let Some(translation) = definition.translation() else {
            return Ok(());
        };
        let reserved = [
            "id",
            LOCALE_KEY,
            ACTIVE_KEY,
            translation.foreign_key.as_str(),
            TIMESTAMP_COLUMNS[0],
            TIMESTAMP_COLUMNS[1],
        ];
        let mut seen = HashSet::new();
        for name in &self.translated_attributes {
            if reserved.contains(&name.as_str()) || !seen.insert(name.as_str()) {
                return Err(invalid(format!(
                    "translated attribute '{}' is reserved or repeated",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Label settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LabelConfig {
    /// Show language names in their own language
    #[serde(default)]
    pub native: bool,
}

impl LabelConfig {
    pub fn style(&self) -> LabelStyle {
        if self.native {
            LabelStyle::Native
        } else {
            LabelStyle::English
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for locale in &self.locales.locales {
            if !seen.insert(locale.as_str()) {
                return Err(ConfigError::DuplicateLocale(locale.clone()));
            }
        }

        if self.locales.use_property_fallback {
            match &self.locales.fallback_locale {
                Some(fallback) if !seen.contains(fallback.as_str()) => {
                    return Err(ConfigError::FallbackNotConfigured(fallback.clone()));
                }
                None => warn!("use_property_fallback is set without a fallback_locale"),
                _ => {}
            }
        }

        for model in &self.models {
            model.validate()?;
        }
        if self.model_registry()?.is_empty() {
            warn!("No models are configured");
        }

        Ok(())
    }

    /// Registry of the configured models
    pub fn model_registry(&self) -> Result<ModelRegistry, ConfigError> {
        let mut registry = ModelRegistry::new();
        for model in &self.models {
            registry.register(model.to_definition())?;
        }
        Ok(registry)
    }

    /// Locale registry with the configured default as request locale
    pub fn locale_registry(&self) -> LocaleRegistry {
        LocaleRegistry::from_config(self.locales.clone())
    }

    /// Database file location
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            locales: LocaleConfig::new(["en", "fr"])
                .with_fallback("en")
                .with_default_locale("en"),
            database_path: None,
            models: vec![ModelConfig {
                name: "pages".to_string(),
                table: None,
                attributes: vec!["position".to_string(), "slug".to_string()],
                translated_attributes: vec!["title".to_string(), "description".to_string()],
                translation_table: None,
                foreign_key: None,
            }],
            labels: LabelConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
