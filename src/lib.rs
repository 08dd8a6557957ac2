/*!
 * # locale-records
 *
 * Multilingual content resolution for a SQLite-backed content store.
 *
 * ## Features
 *
 * - Per-record translation rows tagged with a locale and a published flag
 * - Translated views with optional fallback to a configured locale
 * - Active-translation checks with per-instance memoization
 * - Locale-aware filters, joins and orderings over record collections
 * - ISO 639 language names for locale labels
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration loading and validation
 * - `locale`: Locale settings and the current request locale
 * - `database`: SQLite storage:
 *   - `database::definitions`: Model definitions and the model registry
 *   - `database::models`: Base records and translation rows
 *   - `database::repository`: Writes, reads and query execution
 * - `translation`: Translation lookup and resolution:
 *   - `translation::store`: Memoized translation rows and active checks
 *   - `translation::resolver`: Fallback resolution and active languages
 * - `query`: Composable locale-aware record queries
 * - `language_utils`: Locale labels
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod locale;
pub mod query;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{BaseRecord, ModelDefinition, ModelRegistry, Repository, TranslationModel, TranslationRecord};
pub use errors::{AppError, ConfigError, QueryError, StoreError};
pub use language_utils::{IsoLanguageLabels, LabelLookup};
pub use locale::{FixedLocale, LocaleConfig, LocaleContext, LocaleRegistry};
pub use query::{RecordQuery, SortDirection};
pub use translation::{ActiveLanguage, TranslatedView, TranslationResolver, TranslationStore};
