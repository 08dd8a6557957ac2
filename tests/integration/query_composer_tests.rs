/*!
 * Integration tests for locale-aware query composition
 */

use anyhow::Result;
use rusqlite::types::Value as SqlValue;
use std::sync::Arc;

use locale_records::errors::StoreError;
use locale_records::locale::{FixedLocale, LocaleConfig};
use locale_records::query::{Condition, SortDirection};
use crate::common::{create_page, positions, test_repository};

fn english_default() -> LocaleConfig {
    LocaleConfig::new(["en", "fr"]).with_default_locale("en")
}

/// Test filtering on published translations in the request locale
#[test]
fn test_with_active_translations_withoutLocale_shouldUseRequestLocale() -> Result<()> {
    let repo = test_repository(english_default())?;
    create_page(&repo, 1, &[("en", true, "Published")])?;
    create_page(&repo, 2, &[("en", false, "Draft")])?;
    create_page(&repo, 3, &[("fr", true, "Publié")])?;
    create_page(&repo, 4, &[])?;

    let query = repo.query("pages")?.with_active_translations(None);
    assert_eq!(positions(&repo.get(&query)?), vec![1]);

    let french = repo.for_request(Arc::new(FixedLocale::new("fr")));
    let query = french.query("pages")?.with_active_translations(None);
    assert_eq!(positions(&french.get(&query)?), vec![3]);

    Ok(())
}

/// Test that fallback rows qualify whatever their published flag
#[test]
fn test_with_active_translations_withFallback_shouldIncludeFallbackRows() -> Result<()> {
    let repo = test_repository(english_default().with_fallback("en"))?;
    create_page(&repo, 1, &[("fr", true, "Publié")])?;
    create_page(&repo, 2, &[("en", false, "Draft")])?;
    create_page(&repo, 3, &[("fr", false, "Brouillon")])?;

    let query = repo.query("pages")?.with_active_translations(Some("fr"));
    let records = repo.get(&query)?;
    assert_eq!(positions(&records), vec![1, 2]);

    // Only the rows that matched the filter are attached
    let attached: Vec<_> = records
        .iter()
        .map(|r| r.eager_translations().map(|rows| rows[0].locale.clone()))
        .collect();
    assert_eq!(attached, vec![Some("fr".to_string()), Some("en".to_string())]);

    Ok(())
}

/// Test that the filter composes with base-column conditions
#[test]
fn test_with_active_translations_withBaseConditions_shouldCombine() -> Result<()> {
    let repo = test_repository(english_default())?;
    create_page(&repo, 1, &[("en", true, "One")])?;
    create_page(&repo, 2, &[("en", true, "Two")])?;
    create_page(&repo, 3, &[("en", true, "Three")])?;

    let query = repo
        .query("pages")?
        .with_active_translations(None)
        .where_in("position", vec![SqlValue::Integer(2), SqlValue::Integer(3)])?
        .order_by("position", SortDirection::Desc)?
        .limit(1);

    assert_eq!(positions(&repo.get(&query)?), vec![3]);
    assert_eq!(repo.count(&query.clone().limit(10))?, 2);

    Ok(())
}

/// Test ordering by a translated field
#[test]
fn test_order_by_translation_withDescending_shouldSortAndKeepAllRows() -> Result<()> {
    let repo = test_repository(english_default())?;
    create_page(&repo, 1, &[("en", true, "Banana"), ("fr", true, "Banane")])?;
    create_page(&repo, 2, &[("en", false, "Apple")])?;
    create_page(&repo, 3, &[("en", true, "Cherry")])?;

    let query = repo
        .query("pages")?
        .order_by_translation("title", "desc".parse()?, None)?;
    let records = repo.get(&query)?;

    assert_eq!(positions(&records), vec![3, 1, 2]);
    assert_eq!(records[1].eager_translations().map(<[_]>::len), Some(2));

    Ok(())
}

/// Test ordering by a field that is not translatable
#[test]
fn test_order_by_translation_withUnknownField_shouldFail() -> Result<()> {
    let repo = test_repository(english_default())?;

    let error = repo
        .query("pages")?
        .order_by_translation("position", SortDirection::Asc, None)
        .expect_err("position lives on the base table");
    assert!(matches!(error, StoreError::UnknownAttribute { .. }));

    let error = repo
        .query("tags")?
        .order_by_translation("title", SortDirection::Asc, None)
        .expect_err("tags have no translations");
    assert!(matches!(error, StoreError::NotTranslatable(_)));

    Ok(())
}

/// Test the grouped raw ordering
#[test]
fn test_order_by_raw_grouped_by_translation_withLocale_shouldFilterAndOrder() -> Result<()> {
    let repo = test_repository(english_default())?;
    create_page(&repo, 1, &[("fr", true, "Zèbre"), ("en", true, "Zebra")])?;
    create_page(&repo, 2, &[("fr", true, "Abeille")])?;
    create_page(&repo, 3, &[("en", true, "Ant")])?;

    let query = repo.query("pages")?.order_by_raw_grouped_by_translation(
        "LENGTH(\"t\".\"title\") DESC, \"t\".\"title\" ASC",
        "title",
        Some("fr"),
    )?;
    let records = repo.get(&query)?;

    assert_eq!(positions(&records), vec![2, 1]);
    assert!(records.iter().all(|r| r.translations_loaded()));

    Ok(())
}

/// Test async execution of composed queries
#[tokio::test]
async fn test_get_async_withActiveFilter_shouldMatchSyncResults() -> Result<()> {
    let repo = test_repository(english_default().with_fallback("en"))?;
    create_page(&repo, 1, &[("en", true, "Hello")])?;
    create_page(&repo, 2, &[("de", true, "Hallo")])?;

    let query = repo.query("pages")?.with_active_translations(Some("fr"));
    let sync_positions = positions(&repo.get(&query)?);
    let async_positions = positions(&repo.get_async(query).await?);

    assert_eq!(sync_positions, vec![1]);
    assert_eq!(async_positions, sync_positions);

    Ok(())
}

/// Test a caller-built condition alongside the translation filter
#[test]
fn test_where_condition_withRawPredicate_shouldFilterBaseRows() -> Result<()> {
    let repo = test_repository(english_default())?;
    create_page(&repo, 1, &[("en", true, "One")])?;
    create_page(&repo, 2, &[("en", true, "Two")])?;
    create_page(&repo, 3, &[("en", false, "Three")])?;
    create_page(&repo, 4, &[("en", true, "Four")])?;

    let query = repo
        .query("pages")?
        .with_active_translations(None)
        .where_condition(Condition::raw("\"pages\".\"position\" > ?", vec![SqlValue::Integer(1)]));
    assert_eq!(positions(&repo.get(&query)?), vec![2, 4]);
    assert_eq!(repo.count(&query)?, 2);

    Ok(())
}
