/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use locale_records::app_config::{Config, LogLevel};
use locale_records::errors::ConfigError;
use locale_records::language_utils::LabelStyle;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.locales.locales, vec!["en", "fr"]);
    assert_eq!(config.locales.fallback_locale.as_deref(), Some("en"));
    assert!(config.locales.use_property_fallback);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.labels.style(), LabelStyle::English);

    let models = config.model_registry().expect("default models should register");
    let pages = models.get("pages").expect("pages model should exist");
    let translation = pages.translation().expect("pages should be translatable");
    assert_eq!(translation.table, "page_translations");
    assert_eq!(translation.foreign_key, "page_id");
}

/// Test loading a configuration file with partial content
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "locales": { "locales": ["de", "en"], "default_locale": "de" },
            "models": [
                { "name": "articles", "attributes": ["slug"], "translated_attributes": ["title"] },
                { "name": "tags", "attributes": ["slug"] }
            ],
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert!(config.validate().is_ok());
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(!config.locales.use_property_fallback);
    assert_eq!(config.locale_registry().current_locale(), "de");

    let models = config.model_registry()?;
    assert_eq!(models.len(), 2);
    assert!(models.get("articles").unwrap().is_translatable());
    assert!(!models.get("tags").unwrap().is_translatable());

    Ok(())
}

/// Test saving then loading a configuration
#[test]
fn test_save_withDefaultConfig_shouldLoadBackEqual() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("saved.json");

    let mut config = Config::default();
    config.labels.native = true;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);
    assert_eq!(loaded.labels.style(), LabelStyle::Native);

    Ok(())
}

/// Test loading a malformed file
#[test]
fn test_from_file_withInvalidJson_shouldReturnParseError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ locales: ")?;

    assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::from_file(temp_dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));

    Ok(())
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.locales.locales.push("fr".to_string());
    assert!(matches!(config.validate(), Err(ConfigError::DuplicateLocale(code)) if code == "fr"));
    config.locales.locales.pop();

    config.locales.fallback_locale = Some("de".to_string());
    assert!(matches!(config.validate(), Err(ConfigError::FallbackNotConfigured(code)) if code == "de"));

    // An unlisted fallback is harmless while fallback is off
    config.locales.use_property_fallback = false;
    assert!(config.validate().is_ok());

    let duplicate = config.models[0].clone();
    config.models.push(duplicate);
    assert!(matches!(config.validate(), Err(ConfigError::DuplicateModel(_))));
}

/// Test the database path setting
#[test]
fn test_database_path_withExplicitPath_shouldUseIt() -> Result<()> {
    let mut config = Config::default();
    config.database_path = Some("/tmp/records.db".to_string());

    assert_eq!(config.database_path()?, std::path::PathBuf::from("/tmp/records.db"));
    Ok(())
}

/// Whether validation rejects the default pages model after `edit`
fn rejects_pages(edit: impl FnOnce(&mut Config)) -> bool {
    let mut config = Config::default();
    edit(&mut config);
    matches!(config.validate(), Err(ConfigError::InvalidModel { model, .. }) if model == "pages")
}

/// Test that bookkeeping columns and the foreign key cannot be declared as attributes
#[test]
fn test_validate_withBookkeepingColumnNames_shouldRejectModel() {
    assert!(rejects_pages(|c| c.models[0].translated_attributes.push("created_at".to_string())));
    assert!(rejects_pages(|c| c.models[0].translated_attributes.push("updated_at".to_string())));
    assert!(rejects_pages(|c| c.models[0].translated_attributes.push("page_id".to_string())));
    assert!(rejects_pages(|c| c.models[0].attributes.push("updated_at".to_string())));
    assert!(rejects_pages(|c| c.models[0].attributes.push("created_at".to_string())));

    // An overridden foreign key is reserved under its own name
    assert!(rejects_pages(|c| {
        c.models[0].foreign_key = Some("owner_id".to_string());
        c.models[0].translated_attributes.push("owner_id".to_string());
    }));
    assert!(!rejects_pages(|c| c.models[0].attributes.push("page_id".to_string())));
}

/// Test a configuration without any model
#[test]
fn test_validate_withNoModels_shouldPass() -> Result<()> {
    let mut config = Config::default();
    config.models.clear();

    assert!(config.validate().is_ok());
    assert!(config.model_registry()?.is_empty());

    Ok(())
}
