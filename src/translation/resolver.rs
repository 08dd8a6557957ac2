/*!
 * Resolution of translated attributes.
 *
 * Turns the translation rows of a record into what callers display: the
 * attribute set for one locale (with fallback), the value of one attribute
 * in every available locale, and the list of languages a record exists in.
 */

use anyhow::Result;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::store::{TranslationSource, TranslationStore};
use crate::database::models::{Attributes, BaseRecord};
use crate::language_utils::{IsoLanguageLabels, LabelLookup};
use crate::locale::LocaleRegistry;

/// Translated attributes of a record for one locale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedView {
    /// Locale the caller asked for
    pub requested_locale: String,
    /// Locale of the row the attributes came from, if any
    pub locale: Option<String>,
    /// Whether the fallback locale stood in for the requested one
    pub fallback: bool,
    /// Translated attributes; empty when nothing matched
    pub attributes: Attributes,
}

impl TranslatedView {
    fn missing(requested_locale: &str) -> Self {
        Self {
            requested_locale: requested_locale.to_string(),
            locale: None,
            fallback: false,
            attributes: Attributes::new(),
        }
    }

    /// Whether no translation was found
    pub fn is_empty(&self) -> bool {
        self.locale.is_none()
    }

    /// Translated attribute value, if present
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// One language a record has a translation in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLanguage {
    /// Uppercased locale code
    pub short_label: String,
    /// Display name of the locale
    pub label: String,
    /// Locale code as stored
    pub locale_code: String,
    /// Whether the translation is published
    pub published: bool,
}

/// Resolves translated views of records
#[derive(Debug, Clone)]
pub struct TranslationResolver<S> {
    store: TranslationStore<S>,
    labels: Arc<dyn LabelLookup>,
}

impl<S: TranslationSource> TranslationResolver<S> {
    /// Create a resolver with ISO language names as labels
    pub fn new(source: S, locales: LocaleRegistry) -> Self {
        Self::with_labels(source, locales, Arc::new(IsoLanguageLabels::default()))
    }

    /// Create a resolver with a custom label lookup
    pub fn with_labels(source: S, locales: LocaleRegistry, labels: Arc<dyn LabelLookup>) -> Self {
        Self {
            store: TranslationStore::new(source, locales),
            labels,
        }
    }

    /// Underlying translation store
    pub fn store(&self) -> &TranslationStore<S> {
        &self.store
    }

    /// Translated attributes for `locale`
    ///
    /// Uses the row in exactly that locale; if there is none and fallback is
    /// enabled, the fallback locale's row. Otherwise the view is empty.
    pub fn resolve(&self, record: &BaseRecord, locale: &str) -> Result<TranslatedView> {
        if let Some(row) = self.store.translation_for(record, locale)? {
            return Ok(TranslatedView {
                requested_locale: locale.to_string(),
                locale: Some(row.locale.clone()),
                fallback: false,
                attributes: row.attributes.clone(),
            });
        }

        if let Some(fallback) = self.store.locales().active_fallback() {
            if let Some(row) = self.store.translation_for(record, fallback)? {
                debug!(
                    "{} #{} has no '{}' translation, using fallback '{}'",
                    record.model, record.id, locale, fallback
                );
                return Ok(TranslatedView {
                    requested_locale: locale.to_string(),
                    locale: Some(row.locale.clone()),
                    fallback: true,
                    attributes: row.attributes.clone(),
                });
            }
        }

        debug!("{} #{} has no translation for '{}'", record.model, record.id, locale);
        Ok(TranslatedView::missing(locale))
    }

    /// Translated attributes for the current request locale
    pub fn resolve_current(&self, record: &BaseRecord) -> Result<TranslatedView> {
        let locale = self.store.locales().current_locale();
        self.resolve(record, &locale)
    }

    /// Value of one attribute in every locale the record has a row for
    ///
    /// Each locale maps to its own row's value, never a fallback. Rows
    /// without the attribute map to null.
    pub fn translated_attribute(&self, record: &BaseRecord, key: &str) -> Result<BTreeMap<String, Value>> {
        let rows = self.store.loaded_translations(record)?;
        let mut values = BTreeMap::new();

        for row in rows {
            let value = self
                .store
                .translation_for(record, &row.locale)?
                .and_then(|own| own.get(key))
                .cloned()
                .unwrap_or(Value::Null);
            values.insert(row.locale.clone(), value);
        }

        Ok(values)
    }

    /// Languages the record has rows in, in configured locale order
    ///
    /// Locales missing from the configuration come last, in row order.
    pub fn active_languages(&self, record: &BaseRecord) -> Result<Vec<ActiveLanguage>> {
        let rows = self.store.loaded_translations(record)?;
        let locales = self.store.locales();

        let mut languages: Vec<(usize, ActiveLanguage)> = rows
            .iter()
            .map(|row| {
                let rank = locales.position(&row.locale).unwrap_or(usize::MAX);
                let language = ActiveLanguage {
                    short_label: row.locale.to_uppercase(),
                    label: self.labels.label(&row.locale),
                    locale_code: row.locale.clone(),
                    published: row.active,
                };
                (rank, language)
            })
            .collect();

        // sort_by_key is stable, so ties keep row order
        languages.sort_by_key(|(rank, _)| *rank);

        Ok(languages.into_iter().map(|(_, language)| language).collect())
    }
}
