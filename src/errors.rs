/*!
 * Error types for the locale-records library.
 *
 * Missing translations, models without a translations relation and absent
 * locale configuration are not errors here: they degrade to empty values.
 * The types below cover the storage boundary, configuration files and
 * query building, using the thiserror crate for ergonomic definitions.
 */

use thiserror::Error;

/// Errors raised while talking to the storage layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// No model is registered under the given type tag
    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    /// A model was used where a translations relation is required
    #[error("Model '{0}' has no translations relation")]
    NotTranslatable(String),

    /// An attribute name is not declared on the model
    #[error("Unknown attribute '{attribute}' on table '{table}'")]
    UnknownAttribute {
        /// Table the attribute was looked up in
        table: String,
        /// Attribute name as given by the caller
        attribute: String,
    },

    /// Error reported by SQLite
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected shape
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The same locale code appears more than once
    #[error("Locale '{0}' is listed more than once")]
    DuplicateLocale(String),

    /// The fallback locale is not one of the configured locales
    #[error("Fallback locale '{0}' is not in the configured locales")]
    FallbackNotConfigured(String),

    /// Two models share a type tag
    #[error("Model '{0}' is declared more than once")]
    DuplicateModel(String),

    /// A model field declaration is unusable
    #[error("Invalid model '{model}': {message}")]
    InvalidModel {
        /// Type tag of the offending model
        model: String,
        /// What is wrong with it
        message: String,
    },
}

/// Errors raised while composing a query
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// Sort direction other than asc/desc
    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Query building failure
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(error))
    }
}
