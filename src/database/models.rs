/*!
 * Database entity models.
 *
 * Base records and their translation rows as loaded from SQLite. Attribute
 * values are kept as JSON values so one record type serves every model.
 */

use once_cell::unsync::OnceCell;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name to value
pub type Attributes = BTreeMap<String, Value>;

/// Locale-specific row holding the translatable fields of a base record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID
    pub id: i64,
    /// ID of the owning base record
    pub base_id: i64,
    /// Locale code, stored as given
    pub locale: String,
    /// Whether the row is published for its locale
    pub active: bool,
    /// Translatable attributes
    pub attributes: Attributes,
}

impl TranslationRecord {
    /// Create a translation row (without database IDs)
    pub fn new(locale: impl Into<String>, active: bool, attributes: Attributes) -> Self {
        Self {
            id: 0,
            base_id: 0,
            locale: locale.into(),
            active,
            attributes,
        }
    }

    /// Attribute value, if the row has it
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Untranslated entity row together with its per-instance translation caches
#[derive(Debug, Clone)]
pub struct BaseRecord {
    /// Type tag of the model this record belongs to
    pub model: String,
    /// Primary key
    pub id: i64,
    /// Non-translatable attributes
    pub attributes: Attributes,
    /// Locale the record itself defaults to, if it carries one
    pub default_locale: Option<String>,
    /// Translations relation, set by eager loading
    loaded: OnceCell<Vec<TranslationRecord>>,
    /// Full translation set, fetched once on first use
    memoized: OnceCell<Vec<TranslationRecord>>,
}

impl BaseRecord {
    /// Create a record without any loaded translations
    pub fn new(model: impl Into<String>, id: i64, attributes: Attributes) -> Self {
        Self {
            model: model.into(),
            id,
            attributes,
            default_locale: None,
            loaded: OnceCell::new(),
            memoized: OnceCell::new(),
        }
    }

    /// Set the locale the record defaults to
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Attach an eager-loaded translations relation
    pub fn with_translations(self, translations: Vec<TranslationRecord>) -> Self {
        // A fresh record has an empty cell, so the set cannot fail here.
        let _ = self.loaded.set(translations);
        self
    }

    /// Attribute value, if the record has it
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Eager-loaded translations, if any were attached
    pub fn eager_translations(&self) -> Option<&[TranslationRecord]> {
        self.loaded.get().map(Vec::as_slice)
    }

    /// Whether the translations relation was eager-loaded
    pub fn translations_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub(crate) fn memoized_translations(&self) -> &OnceCell<Vec<TranslationRecord>> {
        &self.memoized
    }
}

/// Convert a SQLite column value into an attribute value
pub fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Convert an attribute value into something SQLite can bind
///
/// Arrays and objects are stored as their JSON text.
pub fn value_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
