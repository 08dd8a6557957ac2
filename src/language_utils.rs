use isolang::Language;
use std::fmt::Debug;

/// Human-readable labels for locale codes
///
/// Locale codes are treated as opaque strings: anything `isolang` cannot
/// make sense of is echoed back unchanged rather than rejected.
pub trait LabelLookup: Debug + Send + Sync {
    /// Display name for a locale code
    fn label(&self, locale: &str) -> String;
}

/// Which name of a language to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    /// English name, e.g. "French"
    #[default]
    English,
    /// Name of the language in itself, e.g. "français"
    Native,
}

/// Label lookup backed by the ISO 639 tables from `isolang`
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoLanguageLabels {
    style: LabelStyle,
}

impl IsoLanguageLabels {
    pub fn new(style: LabelStyle) -> Self {
        Self { style }
    }
}

impl LabelLookup for IsoLanguageLabels {
    fn label(&self, locale: &str) -> String {
        let (language, region) = split_locale(locale);

        let name = match find_language(language) {
            Some(lang) => match self.style {
                LabelStyle::English => lang.to_name().to_string(),
                LabelStyle::Native => lang
                    .to_autonym()
                    .map(capitalize)
                    .unwrap_or_else(|| lang.to_name().to_string()),
            },
            None => return locale.to_string(),
        };

        match region {
            Some(region) => format!("{} ({})", name, region.to_uppercase()),
            None => name,
        }
    }
}

/// Split "pt-BR" / "pt_BR" into language and region subtags
pub fn split_locale(locale: &str) -> (&str, Option<&str>) {
    match locale.split_once(['-', '_']) {
        Some((language, region)) if !region.is_empty() => (language, Some(region)),
        Some((language, _)) => (language, None),
        None => (locale, None),
    }
}

/// Look up an ISO 639-1 or ISO 639-3 language code
pub fn find_language(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Get the English language name for a locale code, if it is a known one
pub fn get_language_name(locale: &str) -> Option<String> {
    let (language, _) = split_locale(locale);
    find_language(language).map(|lang| lang.to_name().to_string())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
