/*!
 * Integration tests for translated views, attribute maps and active languages
 */

use anyhow::Result;
use serde_json::{Value, json};
use std::sync::Arc;

use locale_records::TranslationResolver;
use locale_records::locale::{FixedLocale, LocaleConfig};
use crate::common::{attrs, create_page, test_repository};

/// Page with a published English row and a draft French row
fn hello_bonjour_config() -> LocaleConfig {
    LocaleConfig::new(["fr", "en"])
        .with_fallback("en")
        .with_default_locale("en")
}

/// Test the full resolution flow for a stored record
#[test]
fn test_resolution_withHelloBonjourPage_shouldMatchDocumentedOutcome() -> Result<()> {
    let repo = test_repository(hello_bonjour_config())?;
    let id = create_page(&repo, 1, &[("en", true, "Hello"), ("fr", false, "Bonjour")])?;
    let record = repo.find("pages", id)?.expect("page should exist");
    let resolver = repo.resolver();

    let view = resolver.resolve(&record, "de")?;
    assert_eq!(view.get("title"), Some(&json!("Hello")));
    assert_eq!(view.get("description"), Some(&Value::Null));
    assert_eq!(view.locale.as_deref(), Some("en"));
    assert!(view.fallback);

    assert!(!resolver.store().has_active_translation(&record, Some("fr"))?);
    assert!(resolver.store().has_active_translation(&record, Some("en"))?);

    let languages = resolver.active_languages(&record)?;
    let summary: Vec<_> = languages
        .iter()
        .map(|l| (l.short_label.as_str(), l.label.as_str(), l.published))
        .collect();
    assert_eq!(summary, vec![("FR", "French", false), ("EN", "English", true)]);

    Ok(())
}

/// Test resolution with a different request locale
#[test]
fn test_resolve_current_withRequestLocale_shouldFollowContext() -> Result<()> {
    let repo = test_repository(hello_bonjour_config())?;
    let id = create_page(&repo, 1, &[("en", true, "Hello"), ("fr", false, "Bonjour")])?;

    let french = repo.for_request(Arc::new(FixedLocale::new("fr")));
    let record = french.find("pages", id)?.expect("page should exist");

    let view = french.resolver().resolve_current(&record)?;
    assert_eq!(view.get("title"), Some(&json!("Bonjour")));
    assert_eq!(view.locale.as_deref(), Some("fr"));
    assert!(!view.fallback);

    // Unpublished rows still resolve; only the active checks look at the flag
    assert!(!french.resolver().store().has_active_translation(&record, None)?);

    Ok(())
}

/// Test resolution without fallback
#[test]
fn test_resolve_withoutFallback_shouldReturnEmptyView() -> Result<()> {
    let repo = test_repository(LocaleConfig::new(["en", "fr"]))?;
    let id = create_page(&repo, 1, &[("en", true, "Hello")])?;
    let record = repo.find("pages", id)?.expect("page should exist");

    let view = repo.resolver().resolve(&record, "fr")?;
    assert!(view.is_empty());
    assert_eq!(view.requested_locale, "fr");
    assert_eq!(
        serde_json::to_value(&view)?,
        json!({"requestedLocale": "fr", "locale": null, "fallback": false, "attributes": {}})
    );

    Ok(())
}

/// Test the per-locale attribute map
#[test]
fn test_translated_attribute_withSeveralLocales_shouldNotUseFallback() -> Result<()> {
    let repo = test_repository(hello_bonjour_config())?;
    let id = repo.create_record("pages", &attrs(&[("position", json!(1))]))?;
    repo.add_translation(
        "pages",
        id,
        &locale_records::TranslationRecord::new("en", true, attrs(&[("title", json!("Hello")), ("description", json!("Greeting"))])),
    )?;
    repo.add_translation(
        "pages",
        id,
        &locale_records::TranslationRecord::new("fr", true, attrs(&[("title", json!("Bonjour"))])),
    )?;
    let record = repo.find("pages", id)?.expect("page should exist");

    let descriptions = repo.resolver().translated_attribute(&record, "description")?;
    assert_eq!(descriptions.len(), 2);
    assert_eq!(descriptions["en"], json!("Greeting"));
    assert_eq!(descriptions["fr"], Value::Null);

    Ok(())
}

/// Test records of a model without translations
#[test]
fn test_resolver_withPlainModel_shouldDegradeToEmpty() -> Result<()> {
    let repo = test_repository(hello_bonjour_config())?;
    let id = repo.create_record("tags", &attrs(&[("slug", json!("news"))]))?;
    let record = repo.find("tags", id)?.expect("tag should exist");
    let resolver = repo.resolver();

    assert!(resolver.resolve(&record, "en")?.is_empty());
    assert!(resolver.translated_attribute(&record, "title")?.is_empty());
    assert!(resolver.active_languages(&record)?.is_empty());
    assert!(!resolver.store().has_active_translation(&record, Some("en"))?);

    Ok(())
}

/// Test a resolver built directly over the repository
#[test]
fn test_resolver_withEagerLoadedRecords_shouldNotRefetch() -> Result<()> {
    let repo = test_repository(hello_bonjour_config())?;
    create_page(&repo, 1, &[("en", true, "Hello"), ("fr", true, "Bonjour")])?;

    let query = repo.query("pages")?.with_translations();
    let records = repo.get(&query)?;
    let resolver = TranslationResolver::new(&repo, repo.locales().clone());

    assert_eq!(resolver.resolve(&records[0], "fr")?.get("title"), Some(&json!("Bonjour")));
    assert_eq!(resolver.active_languages(&records[0])?.len(), 2);

    Ok(())
}
