/*!
 * Database schema derived from the registered models.
 *
 * Every model gets a base table; translatable models also get a translation
 * table indexed on (foreign key, locale). Tables are created on open and
 * columns declared after a table was first created are added in place. The
 * layout version is kept in SQLite's `user_version` header field.
 */

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::collections::HashSet;

use super::definitions::{ACTIVE_KEY, LOCALE_KEY, ModelDefinition, ModelRegistry};

/// Layout version written by this build
pub const SCHEMA_VERSION: i32 = 1;

/// Bookkeeping columns present on every table
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Quote an identifier for use in SQL text
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check the layout version and stamp fresh databases
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;

    match version {
        0 => {
            info!("Stamping new database with schema v{}", SCHEMA_VERSION);
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("Failed to write schema version")?;
        }
        v if v == SCHEMA_VERSION => debug!("Database schema is v{}", v),
        v => bail!(
            "Database schema v{} is newer than the supported v{}",
            v,
            SCHEMA_VERSION
        ),
    }

    Ok(())
}

/// Layout version recorded in the database, 0 for a fresh file
pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read schema version")
}

/// Create or extend the tables of every registered model
pub fn initialize_models(conn: &Connection, registry: &ModelRegistry) -> Result<()> {
    for model in registry.models() {
        create_model_tables(conn, &model)?;
    }
    Ok(())
}

/// Create the base table and, if translatable, the translation table of a model
pub fn create_model_tables(conn: &Connection, model: &ModelDefinition) -> Result<()> {
    let base = quote_ident(&model.table);
    let key = quote_ident(&model.key_name);

    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", key)];
    columns.extend(model.attributes.iter().map(|a| quote_ident(a)));
    columns.extend(TIMESTAMP_COLUMNS.map(|c| format!("{} TEXT", c)));
    create_table(conn, &model.table, &columns)?;
    add_missing_columns(conn, &model.table, &model.attributes)?;

    let Some(translation) = model.translation() else {
        debug!("Model {} uses table {}", model.name, model.table);
        return Ok(());
    };

    let fk = quote_ident(&translation.foreign_key);
    let mut columns = vec![
        "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
        format!("{} INTEGER NOT NULL REFERENCES {}({}) ON DELETE CASCADE", fk, base, key),
        format!("{} TEXT NOT NULL", quote_ident(LOCALE_KEY)),
        format!("{} INTEGER NOT NULL DEFAULT 0", quote_ident(ACTIVE_KEY)),
    ];
    columns.extend(translation.attributes.iter().map(|a| quote_ident(a)));
    columns.extend(TIMESTAMP_COLUMNS.map(|c| format!("{} TEXT", c)));
    create_table(conn, &translation.table, &columns)?;
    add_missing_columns(conn, &translation.table, &translation.attributes)?;

    conn.execute_batch(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {}({}, {});",
        quote_ident(&format!("idx_{}_locale", translation.table)),
        quote_ident(&translation.table),
        fk,
        quote_ident(LOCALE_KEY),
    ))
    .with_context(|| format!("Failed to index {}", translation.table))?;

    debug!(
        "Model {} uses tables {} and {}",
        model.name, model.table, translation.table
    );
    Ok(())
}

fn create_table(conn: &Connection, table: &str, columns: &[String]) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_ident(table),
        columns.join(", ")
    ))
    .with_context(|| format!("Failed to create table {}", table))
}

/// Columns currently present on a table
pub fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

/// Add declared attributes that an older table does not have yet
fn add_missing_columns(conn: &Connection, table: &str, declared: &[String]) -> Result<()> {
    let existing = table_columns(conn, table)?;

    for column in declared.iter().filter(|c| !existing.contains(c.as_str())) {
        warn!("Adding column {} to existing table {}", column, table);
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {};",
            quote_ident(table),
            quote_ident(column)
        ))
        .with_context(|| format!("Failed to add column {} to {}", column, table))?;
    }

    Ok(())
}
