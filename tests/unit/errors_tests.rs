/*!
 * Tests for error types and conversions
 */

use locale_records::errors::{AppError, ConfigError, QueryError, StoreError};

/// Test display messages of store errors
#[test]
fn test_store_error_display_withFields_shouldNameThem() {
    let error = StoreError::UnknownAttribute {
        table: "page_translations".to_string(),
        attribute: "body".to_string(),
    };
    assert_eq!(error.to_string(), "Unknown attribute 'body' on table 'page_translations'");

    let error = StoreError::UnknownModel("posts".to_string());
    assert_eq!(error.to_string(), "Unknown model type: posts");
}

/// Test wrapping library errors into the application error
#[test]
fn test_app_error_from_withLibraryErrors_shouldPickVariant() {
    let error: AppError = StoreError::NotTranslatable("tags".to_string()).into();
    assert!(matches!(error, AppError::Store(StoreError::NotTranslatable(_))));

    let error: AppError = ConfigError::DuplicateLocale("en".to_string()).into();
    assert!(matches!(error, AppError::Config(_)));

    let error: AppError = QueryError::InvalidDirection("up".to_string()).into();
    assert_eq!(error.to_string(), "Query error: Invalid sort direction: up");

    let error: AppError = rusqlite::Error::InvalidQuery.into();
    assert!(matches!(error, AppError::Store(StoreError::Sqlite(_))));

    let error: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(error, AppError::Unknown(message) if message == "boom"));
}
