/*!
 * Database module for persistent storage of records and their translations.
 *
 * This module provides SQLite-based persistence for:
 * - Model definitions and the tables derived from them
 * - Base records and locale-specific translation rows
 * - Execution of composed record queries with eager loading
 */

pub mod connection;
pub mod definitions;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use definitions::{ModelDefinition, ModelRegistry, TranslationModel};
pub use models::{Attributes, BaseRecord, TranslationRecord};
pub use repository::Repository;
