/*!
 * Repository layer for database operations.
 *
 * This module provides the high-level API over the SQLite store: inserting
 * records and translation rows, running composed record queries with eager
 * loading, and serving translation rows to the translation store.
 */

use anyhow::Result;
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use std::collections::HashMap;
use std::sync::Arc;

use super::connection::DatabaseConnection;
use super::definitions::{ACTIVE_KEY, LOCALE_KEY, ModelDefinition, ModelRegistry, TranslationModel};
use super::models::{Attributes, BaseRecord, TranslationRecord, value_from_sql, value_to_sql};
use super::schema::{TIMESTAMP_COLUMNS, quote_ident};
use crate::locale::{LocaleContext, LocaleRegistry};
use crate::query::condition::{Condition, column};
use crate::query::{EagerLoad, RecordQuery};
use crate::translation::{TranslationResolver, TranslationSource};

/// Repository for database operations
#[derive(Debug, Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
    /// Known models
    models: Arc<ModelRegistry>,
    /// Locale settings and request locale
    locales: LocaleRegistry,
}

impl Repository {
    /// Create a new repository over an opened database
    pub fn new(db: DatabaseConnection, models: Arc<ModelRegistry>, locales: LocaleRegistry) -> Self {
        Self { db, models, locales }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory(models: ModelRegistry, locales: LocaleRegistry) -> Result<Self> {
        let db = DatabaseConnection::new_in_memory(&models)?;
        Ok(Self::new(db, Arc::new(models), locales))
    }

    /// Same database and models, seen from another request locale
    pub fn for_request(&self, context: Arc<dyn LocaleContext>) -> Self {
        Self {
            db: self.db.clone(),
            models: Arc::clone(&self.models),
            locales: self.locales.with_context(context),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn locales(&self) -> &LocaleRegistry {
        &self.locales
    }

    /// Resolver reading translations through this repository
    pub fn resolver(&self) -> TranslationResolver<&Self> {
        TranslationResolver::new(self, self.locales.clone())
    }

    /// Start a query over a model's records
    pub fn query(&self, model: &str) -> Result<RecordQuery> {
        let model = self.models.require(model)?;
        Ok(RecordQuery::new(model, self.locales.clone()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a base record and return its ID
    pub fn create_record(&self, model: &str, attributes: &Attributes) -> Result<i64> {
        let model = self.models.require(model)?;
        for name in attributes.keys() {
            model.require_attribute(name)?;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut columns: Vec<String> = attributes.keys().map(|k| quote_ident(k)).collect();
        let mut values: Vec<SqlValue> = attributes.values().map(value_to_sql).collect();
        columns.extend(TIMESTAMP_COLUMNS.map(quote_ident));
        values.extend([SqlValue::Text(now.clone()), SqlValue::Text(now)]);

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&model.table),
            columns.join(", "),
            vec!["?"; values.len()].join(", ")
        );

        self.db.execute(|conn| {
            conn.execute(&sql, params_from_iter(values.iter()))?;
            let id = conn.last_insert_rowid();
            debug!("Created {} #{}", model.name, id);
            Ok(id)
        })
    }

    /// Insert a translation row for a base record and return its ID
    pub fn add_translation(&self, model: &str, base_id: i64, translation: &TranslationRecord) -> Result<i64> {
        let model = self.models.require(model)?;
        let table = model.require_translation()?;
        for name in translation.attributes.keys() {
            table.require_attribute(name)?;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut columns = vec![
            quote_ident(&table.foreign_key),
            quote_ident(LOCALE_KEY),
            quote_ident(ACTIVE_KEY),
        ];
        let mut values = vec![
            SqlValue::Integer(base_id),
            SqlValue::Text(translation.locale.clone()),
            SqlValue::Integer(i64::from(translation.active)),
        ];
        columns.extend(translation.attributes.keys().map(|k| quote_ident(k)));
        values.extend(translation.attributes.values().map(value_to_sql));
        columns.extend(TIMESTAMP_COLUMNS.map(quote_ident));
        values.extend([SqlValue::Text(now.clone()), SqlValue::Text(now)]);

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&table.table),
            columns.join(", "),
            vec!["?"; values.len()].join(", ")
        );

        self.db.execute(|conn| {
            conn.execute(&sql, params_from_iter(values.iter()))?;
            Ok(conn.last_insert_rowid())
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Find a record by ID, without loading translations
    pub fn find(&self, model: &str, id: i64) -> Result<Option<BaseRecord>> {
        let model = self.models.require(model)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(&model.table),
            quote_ident(&model.key_name)
        );

        self.db.execute(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names = column_names(&stmt);
            let record = stmt
                .query_row([id], |row| map_base_row(row, &model, &names))
                .optional()?;
            Ok(record)
        })
    }

    /// Run a composed query and attach its eager-loaded translations
    pub fn get(&self, query: &RecordQuery) -> Result<Vec<BaseRecord>> {
        self.db.execute(|conn| fetch_records(conn, query))
    }

    /// Run a composed query on the blocking thread pool
    pub async fn get_async(&self, query: RecordQuery) -> Result<Vec<BaseRecord>> {
        self.db
            .execute_async(move |conn| fetch_records(conn, &query))
            .await
    }

    /// First record of a composed query
    pub fn first(&self, query: &RecordQuery) -> Result<Option<BaseRecord>> {
        let records = self.get(&query.clone().limit(1))?;
        Ok(records.into_iter().next())
    }

    /// Number of rows a composed query returns
    pub fn count(&self, query: &RecordQuery) -> Result<i64> {
        let (sql, params) = query.to_count_sql();
        self.db.execute(|conn| {
            let count = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
            Ok(count)
        })
    }
}

impl TranslationSource for Repository {
    fn fetch_translations(&self, record: &BaseRecord) -> Result<Vec<TranslationRecord>> {
        let model = self.models.require(&record.model)?;
        let Some(translation) = model.translation() else {
            return Ok(Vec::new());
        };

        self.db.execute(|conn| {
            let mut grouped = load_translations(conn, translation, &[record.id], None)?;
            Ok(grouped.remove(&record.id).unwrap_or_default())
        })
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn map_base_row(
    row: &rusqlite::Row<'_>,
    model: &ModelDefinition,
    names: &[String],
) -> rusqlite::Result<BaseRecord> {
    let mut id = 0;
    let mut attributes = Attributes::new();

    for (i, name) in names.iter().enumerate() {
        if *name == model.key_name {
            id = row.get(i)?;
        } else if model.attributes.contains(name) {
            attributes.insert(name.clone(), value_from_sql(row.get_ref(i)?));
        }
    }

    Ok(BaseRecord::new(model.name.clone(), id, attributes))
}

fn map_translation_row(
    row: &rusqlite::Row<'_>,
    translation: &TranslationModel,
    names: &[String],
) -> rusqlite::Result<TranslationRecord> {
    let mut record = TranslationRecord::new(String::new(), false, Attributes::new());

    for (i, name) in names.iter().enumerate() {
        match name.as_str() {
            "id" => record.id = row.get(i)?,
            LOCALE_KEY => record.locale = row.get(i)?,
            ACTIVE_KEY => record.active = row.get::<_, Option<bool>>(i)?.unwrap_or(false),
            fk if fk == translation.foreign_key => record.base_id = row.get(i)?,
            // Bookkeeping and undeclared columns stay out of the attributes
            column if translation.has_attribute(column) => {
                record
                    .attributes
                    .insert(name.clone(), value_from_sql(row.get_ref(i)?));
            }
            _ => {}
        }
    }

    Ok(record)
}

fn fetch_records(conn: &Connection, query: &RecordQuery) -> Result<Vec<BaseRecord>> {
    let model = query.model();
    let (sql, params) = query.to_sql();
    debug!("Running query: {}", sql);

    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let records: Vec<BaseRecord> = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            map_base_row(row, model, &names)
        })?
        .collect::<rusqlite::Result<_>>()?;

    let (Some(eager), Some(translation)) = (query.eager_load(), model.translation()) else {
        return Ok(records);
    };

    let mut ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();

    let condition = match eager {
        EagerLoad::All => None,
        EagerLoad::Matching(condition) => Some(condition),
    };
    let grouped = load_translations(conn, translation, &ids, condition)?;

    Ok(records
        .into_iter()
        .map(|record| {
            let rows = grouped.get(&record.id).cloned().unwrap_or_default();
            record.with_translations(rows)
        })
        .collect())
}

fn load_translations(
    conn: &Connection,
    translation: &TranslationModel,
    ids: &[i64],
    condition: Option<&Condition>,
) -> Result<HashMap<i64, Vec<TranslationRecord>>> {
    let mut grouped: HashMap<i64, Vec<TranslationRecord>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let owner = Condition::is_in(
        column(&translation.table, &translation.foreign_key),
        ids.iter().map(|id| SqlValue::Integer(*id)).collect(),
    );
    let filter = match condition {
        Some(condition) => Condition::All(vec![owner, condition.clone()]),
        None => owner,
    };

    let mut sql = format!("SELECT * FROM {} WHERE ", quote_ident(&translation.table));
    let mut params = Vec::new();
    filter.render(&mut sql, &mut params);
    sql.push_str(&format!(" ORDER BY {}", column(&translation.table, "id")));

    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        map_translation_row(row, translation, &names)
    })?;

    for row in rows {
        let row = row?;
        grouped.entry(row.base_id).or_default().push(row);
    }

    Ok(grouped)
}
