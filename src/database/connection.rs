/*!
 * SQLite connection handling.
 *
 * One connection per store, shared behind a mutex. Opening a store enables
 * foreign keys, checks the layout version and creates the tables of every
 * registered model. Work runs either on the caller's thread or, for async
 * hosts, on tokio's blocking pool.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::definitions::ModelRegistry;
use super::schema::{self, quote_ident};

/// File name of the store under the data directory
const DEFAULT_DB_FILENAME: &str = "locale-records.db";

/// Application folder under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "locale-records";

/// Shared handle to an opened store
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl DatabaseConnection {
    /// Open (or create) a store file and set up tables for the models
    pub fn new<P: AsRef<Path>>(db_path: P, models: &ModelRegistry) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        match db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create directory {:?}", dir))?,
            _ => {}
        }

        info!("Opening content store {:?}", db_path);
        let conn = Connection::open(&db_path).with_context(|| format!("Cannot open {:?}", db_path))?;
        Self::prepare(conn, db_path, models)
    }

    /// Open a throwaway store in memory
    pub fn new_in_memory(models: &ModelRegistry) -> Result<Self> {
        debug!("Opening in-memory content store");
        let conn = Connection::open_in_memory().context("Cannot open in-memory store")?;
        Self::prepare(conn, PathBuf::from(":memory:"), models)
    }

    fn prepare(conn: Connection, db_path: PathBuf, models: &ModelRegistry) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Cannot enable foreign keys")?;
        schema::initialize_schema(&conn)?;
        schema::initialize_models(&conn, models)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data dir>/locale-records/locale-records.db`
    pub fn default_database_path() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| anyhow!("No data directory for this user"))?;

        Ok(data_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Location of the store, `:memory:` for in-memory stores
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
        connection
            .lock()
            .map_err(|e| anyhow!("Content store lock poisoned: {}", e))
    }

    /// Run a closure against the connection on the current thread
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = Self::lock(&self.connection)?;
        f(&conn)
    }

    /// Run a closure against the connection on the blocking thread pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let conn = Self::lock(&connection)?;
            f(&conn)
        })
        .await
        .context("Content store task did not complete")?
    }

    /// Run a closure inside a transaction, committing if it succeeds
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        let mut conn = Self::lock(&self.connection)?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Row counts for every registered model
    pub fn stats(&self, models: &ModelRegistry) -> Result<DatabaseStats> {
        self.execute(|conn| {
            let tables = models
                .models()
                .iter()
                .map(|model| {
                    let translations = match model.translation() {
                        Some(translation) => count_rows(conn, &translation.table)?,
                        None => 0,
                    };
                    Ok(ModelStats {
                        model: model.name.clone(),
                        records: count_rows(conn, &model.table)?,
                        translations,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(DatabaseStats { tables })
        })
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    conn.query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("Cannot count rows of {}", table))
}

/// Row counts for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStats {
    /// Model type tag
    pub model: String,
    /// Number of base records
    pub records: i64,
    /// Number of translation rows
    pub translations: i64,
}

/// Row counts of a store, sorted by model name
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    pub tables: Vec<ModelStats>,
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .tables
            .iter()
            .map(|t| format!("{}: {} records, {} translations", t.model, t.records, t.translations))
            .collect();
        f.write_str(&parts.join("; "))
    }
}
