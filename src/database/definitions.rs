/*!
 * Model definitions and the model registry.
 *
 * Every model is described once at startup: its base table, its plain
 * columns and, when the model is translatable, the table holding its
 * translation rows. The registry maps a model type tag to that description.
 */

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ConfigError, StoreError};

/// Column holding the locale code on translation tables
pub const LOCALE_KEY: &str = "locale";

/// Column holding the published flag on translation tables
pub const ACTIVE_KEY: &str = "active";

/// Where a model's translation rows live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationModel {
    /// Translation table name
    pub table: String,
    /// Column referencing the base record key
    pub foreign_key: String,
    /// Translatable columns
    pub attributes: Vec<String>,
}

impl TranslationModel {
    /// Translation table and foreign key derived from the base table name
    ///
    /// `pages` gives `page_translations` keyed by `page_id`. Only regular
    /// English plurals are handled (`-s`, `-ies`, `-es` after a sibilant, plus
    /// a few uncountable words such as `news`); other table names need the
    /// explicit translation table and foreign key.
    pub fn conventional<I, S>(base_table: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let singular = singularize(base_table);
        Self {
            table: format!("{}_translations", singular),
            foreign_key: format!("{}_id", singular),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Translation table with explicit names
    pub fn explicit<I, S>(table: impl Into<String>, foreign_key: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the column is a translatable attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Fail unless the column is a translatable attribute
    pub fn require_attribute(&self, name: &str) -> Result<(), StoreError> {
        if self.has_attribute(name) {
            Ok(())
        } else {
            Err(StoreError::UnknownAttribute {
                table: self.table.clone(),
                attribute: name.to_string(),
            })
        }
    }
}

/// A model backed by a base table, optionally translatable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    /// Type tag the model is registered under
    pub name: String,
    /// Base table name
    pub table: String,
    /// Primary key column
    pub key_name: String,
    /// Non-translatable columns
    pub attributes: Vec<String>,
    translation: Option<TranslationModel>,
}

impl ModelDefinition {
    /// A model without translations
    pub fn new<I, S>(name: impl Into<String>, table: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            table: table.into(),
            key_name: "id".to_string(),
            attributes: attributes.into_iter().map(Into::into).collect(),
            translation: None,
        }
    }

    /// Attach a translations relation
    pub fn translatable(mut self, translation: TranslationModel) -> Self {
        self.translation = Some(translation);
        self
    }

    /// Translations relation, if the model has one
    pub fn translation(&self) -> Option<&TranslationModel> {
        self.translation.as_ref()
    }

    /// Translations relation, or an error naming the model
    pub fn require_translation(&self) -> Result<&TranslationModel, StoreError> {
        self.translation
            .as_ref()
            .ok_or_else(|| StoreError::NotTranslatable(self.name.clone()))
    }

    /// Whether the model has a translations relation
    pub fn is_translatable(&self) -> bool {
        self.translation.is_some()
    }

    /// Whether the column is a plain attribute or the key
    pub fn has_attribute(&self, name: &str) -> bool {
        name == self.key_name || self.attributes.iter().any(|a| a == name)
    }

    /// Fail unless the column is a plain attribute or the key
    pub fn require_attribute(&self, name: &str) -> Result<(), StoreError> {
        if self.has_attribute(name) {
            Ok(())
        } else {
            Err(StoreError::UnknownAttribute {
                table: self.table.clone(),
                attribute: name.to_string(),
            })
        }
    }
}

/// Registry of all known models, built once at startup
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its type tag
    pub fn register(&mut self, model: ModelDefinition) -> Result<Arc<ModelDefinition>, ConfigError> {
        if self.models.contains_key(&model.name) {
            return Err(ConfigError::DuplicateModel(model.name));
        }

        let model = Arc::new(model);
        self.models.insert(model.name.clone(), Arc::clone(&model));
        Ok(model)
    }

    /// Look up a model by type tag
    pub fn get(&self, name: &str) -> Option<Arc<ModelDefinition>> {
        self.models.get(name).cloned()
    }

    /// Look up a model by type tag, failing if it is unknown
    pub fn require(&self, name: &str) -> Result<Arc<ModelDefinition>, StoreError> {
        self.get(name)
            .ok_or_else(|| StoreError::UnknownModel(name.to_string()))
    }

    /// All registered models, sorted by type tag
    pub fn models(&self) -> Vec<Arc<ModelDefinition>> {
        let mut models: Vec<_> = self.models.values().cloned().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Plural table names whose singular is the same word
const UNCOUNTABLE: [&str; 3] = ["news", "series", "species"];

/// Endings that take `-es` in the plural
const SIBILANT_ENDINGS: [&str; 5] = ["sses", "xes", "zzes", "ches", "shes"];

fn singularize(table: &str) -> String {
    let last_word = table.rsplit('_').next().unwrap_or(table);

    if UNCOUNTABLE.contains(&last_word) || table.ends_with("ss") {
        table.to_string()
    } else if let Some(stem) = table.strip_suffix("ies") {
        format!("{}y", stem)
    } else if SIBILANT_ENDINGS.iter().any(|ending| table.ends_with(ending)) {
        table[..table.len() - 2].to_string()
    } else if let Some(stem) = table.strip_suffix('s') {
        stem.to_string()
    } else {
        table.to_string()
    }
}
