/*!
 * Locale registry.
 *
 * Holds the immutable locale configuration loaded at startup together with
 * the collaborator that knows the locale of the current request. Nothing in
 * the crate reads locale settings from global state; a `LocaleRegistry` is
 * handed to the resolver and the query composer instead.
 */

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Process-wide locale settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Supported locale codes, in display order
    #[serde(default)]
    pub locales: Vec<String>,

    /// Locale substituted when a record has no row for the requested one
    #[serde(default)]
    pub fallback_locale: Option<String>,

    /// Whether the fallback locale is used at all
    #[serde(default)]
    pub use_property_fallback: bool,

    /// Locale of a request that does not specify one
    #[serde(default)]
    pub default_locale: Option<String>,
}

impl LocaleConfig {
    /// Create a configuration with the given locales and no fallback
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Enable fallback to the given locale
    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = Some(locale.into());
        self.use_property_fallback = true;
        self
    }

    /// Set the locale used when the request does not carry one
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }
}

/// Supplies the locale of the current request or session
pub trait LocaleContext: Debug + Send + Sync {
    /// Locale to use when an operation is not given one explicitly
    fn current_locale(&self) -> String;
}

/// A locale context that always answers with the same code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLocale(pub String);

impl FixedLocale {
    /// Create a context for the given locale code
    pub fn new(locale: impl Into<String>) -> Self {
        Self(locale.into())
    }
}

impl LocaleContext for FixedLocale {
    fn current_locale(&self) -> String {
        self.0.clone()
    }
}

/// Read-only view over locale settings and the current request locale
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    config: Arc<LocaleConfig>,
    context: Arc<dyn LocaleContext>,
}

impl LocaleRegistry {
    /// Create a registry from shared configuration and a locale context
    pub fn new(config: Arc<LocaleConfig>, context: Arc<dyn LocaleContext>) -> Self {
        Self { config, context }
    }

    /// Create a registry whose current locale is the configured default
    ///
    /// Without a default locale the first configured locale is used, and an
    /// empty configuration yields an empty locale code.
    pub fn from_config(config: LocaleConfig) -> Self {
        let current = config
            .default_locale
            .clone()
            .or_else(|| config.locales.first().cloned())
            .unwrap_or_default();

        Self::new(Arc::new(config), Arc::new(FixedLocale(current)))
    }

    /// Same settings, different request locale
    pub fn with_context(&self, context: Arc<dyn LocaleContext>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            context,
        }
    }

    /// Shared configuration backing this registry
    pub fn config(&self) -> &Arc<LocaleConfig> {
        &self.config
    }

    /// Locale of the current request
    pub fn current_locale(&self) -> String {
        self.context.current_locale()
    }

    /// Configured locales in display order
    pub fn configured_locales(&self) -> &[String] {
        &self.config.locales
    }

    /// Configured fallback locale, whether or not fallback is enabled
    pub fn fallback_locale(&self) -> Option<&str> {
        self.config.fallback_locale.as_deref()
    }

    /// Whether fallback substitution is switched on
    pub fn fallback_enabled(&self) -> bool {
        self.config.use_property_fallback
    }

    /// Fallback locale to apply right now, if any
    pub fn active_fallback(&self) -> Option<&str> {
        if !self.fallback_enabled() {
            return None;
        }

        let fallback = self.fallback_locale();
        if fallback.is_none() {
            warn!("Locale fallback is enabled but no fallback locale is configured");
        }
        fallback
    }

    /// Explicit locale if given, otherwise the current request locale
    pub fn resolve_locale(&self, locale: Option<&str>) -> String {
        match locale {
            Some(code) => code.to_string(),
            None => self.current_locale(),
        }
    }

    /// Index of a locale in the configured list
    pub fn position(&self, locale: &str) -> Option<usize> {
        self.config.locales.iter().position(|l| l == locale)
    }

    /// Whether the locale is one of the configured ones
    pub fn is_configured(&self, locale: &str) -> bool {
        self.position(locale).is_some()
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::from_config(LocaleConfig::default())
    }
}
