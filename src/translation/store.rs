/*!
 * Translation store.
 *
 * Reads the translation rows of a base record and answers per-locale
 * questions about them. The full set of rows is fetched at most once per
 * in-memory record instance and reused afterwards.
 */

use anyhow::Result;
use log::debug;

use crate::database::models::{BaseRecord, TranslationRecord};
use crate::locale::LocaleRegistry;

/// Anything that can fetch the translation rows of a record
pub trait TranslationSource {
    /// All translation rows of the record, in storage order
    fn fetch_translations(&self, record: &BaseRecord) -> Result<Vec<TranslationRecord>>;
}

impl<T: TranslationSource + ?Sized> TranslationSource for &T {
    fn fetch_translations(&self, record: &BaseRecord) -> Result<Vec<TranslationRecord>> {
        (**self).fetch_translations(record)
    }
}

/// Per-record translation lookups backed by a `TranslationSource`
#[derive(Debug, Clone)]
pub struct TranslationStore<S> {
    source: S,
    locales: LocaleRegistry,
}

impl<S: TranslationSource> TranslationStore<S> {
    pub fn new(source: S, locales: LocaleRegistry) -> Self {
        Self { source, locales }
    }

    /// Locale settings used by this store
    pub fn locales(&self) -> &LocaleRegistry {
        &self.locales
    }

    /// All translation rows of the record
    ///
    /// The first call fetches and caches the rows on the record; later calls
    /// on the same instance return the cached rows without fetching again.
    pub fn translations_for<'r>(&self, record: &'r BaseRecord) -> Result<&'r [TranslationRecord]> {
        let rows = record.memoized_translations().get_or_try_init(|| {
            debug!("Fetching translations for {} #{}", record.model, record.id);
            self.source.fetch_translations(record)
        })?;
        Ok(rows.as_slice())
    }

    /// Whether the record has a published row for the locale
    ///
    /// Without a locale, the record's own default locale is used, and
    /// failing that the current request locale.
    pub fn has_active_translation(&self, record: &BaseRecord, locale: Option<&str>) -> Result<bool> {
        let locale = match locale {
            Some(code) => code.to_string(),
            None => record
                .default_locale
                .clone()
                .unwrap_or_else(|| self.locales.current_locale()),
        };

        let rows = self.translations_for(record)?;
        Ok(rows.iter().any(|row| row.locale == locale && row.active))
    }

    /// The translations relation: eager-loaded rows if present, otherwise
    /// the full memoized set
    pub fn loaded_translations<'r>(&self, record: &'r BaseRecord) -> Result<&'r [TranslationRecord]> {
        match record.eager_translations() {
            Some(rows) => Ok(rows),
            None => self.translations_for(record),
        }
    }

    /// First loaded row in exactly this locale
    pub fn translation_for<'r>(
        &self,
        record: &'r BaseRecord,
        locale: &str,
    ) -> Result<Option<&'r TranslationRecord>> {
        let rows = self.loaded_translations(record)?;
        Ok(rows.iter().find(|row| row.locale == locale))
    }
}
