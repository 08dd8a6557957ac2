#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use locale_records::app_config::{self, Config};
use locale_records::database::{Attributes, BaseRecord, DatabaseConnection, Repository, TranslationRecord};
use locale_records::language_utils::IsoLanguageLabels;
use locale_records::query::SortDirection;
use locale_records::{FixedLocale, TranslationResolver};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SortDirection to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDirection {
    Asc,
    Desc,
}

impl From<CliDirection> for SortDirection {
    fn from(direction: CliDirection) -> Self {
        match direction {
            CliDirection::Asc => SortDirection::Asc,
            CliDirection::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database tables for the configured models
    Init,

    /// Insert a few translated pages to play with
    SeedDemo,

    /// Show a record's translated attributes for a locale
    Resolve {
        #[arg(short, long)]
        model: String,
        #[arg(short, long)]
        id: i64,
        /// Locale to resolve; the request locale when omitted
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// List the languages a record is available in
    Languages {
        #[arg(short, long)]
        model: String,
        #[arg(short, long)]
        id: i64,
    },

    /// Show one attribute in every locale a record has
    Attribute {
        #[arg(short, long)]
        model: String,
        #[arg(short, long)]
        id: i64,
        #[arg(short, long)]
        key: String,
    },

    /// List records, optionally filtered and ordered by translations
    List {
        #[arg(short, long)]
        model: String,
        /// Target locale; the request locale when omitted
        #[arg(short, long)]
        locale: Option<String>,
        /// Only records with a published translation
        #[arg(long)]
        active_only: bool,
        /// Translated field to order by
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long, value_enum, default_value = "asc")]
        direction: CliDirection,
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Show row counts per model
    Stats,
}

/// locale-records - multilingual content resolution over SQLite
#[derive(Parser, Debug)]
#[command(name = "locale-records")]
#[command(version = "0.1.0")]
#[command(about = "Resolve and query translated records")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Request locale, overriding the configured default
    #[arg(long, global = true)]
    request_locale: Option<String>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

struct CliLogger {
    level: LevelFilter,
}

impl CliLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CliLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at trace so the configured level can only narrow it
    CliLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    let mut config = load_config(&cli.config_path)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config
        .validate()
        .context("Configuration validation failed")?;

    let models = config.model_registry()?;
    let db_path = config.database_path()?;
    let db = DatabaseConnection::new(&db_path, &models)?;
    let mut repository = Repository::new(db, Arc::new(models), config.locale_registry());
    if let Some(locale) = &cli.request_locale {
        repository = repository.for_request(Arc::new(FixedLocale::new(locale.clone())));
    }

    match cli.command {
        Commands::Init => {
            info!("Database ready at {:?}", db_path);
        }
        Commands::SeedDemo => seed_demo(&repository)?,
        Commands::Resolve { model, id, locale } => {
            let record = find_record(&repository, &model, id)?;
            let resolver = build_resolver(&repository, &config);
            let view = match locale {
                Some(locale) => resolver.resolve(&record, &locale)?,
                None => resolver.resolve_current(&record)?,
            };
            if view.is_empty() {
                warn!("{} #{} has no translation for '{}'", model, id, view.requested_locale);
            }
            print_json(&view)?;
        }
        Commands::Languages { model, id } => {
            let record = find_record(&repository, &model, id)?;
            print_json(&build_resolver(&repository, &config).active_languages(&record)?)?;
        }
        Commands::Attribute { model, id, key } => {
            let record = find_record(&repository, &model, id)?;
            print_json(&build_resolver(&repository, &config).translated_attribute(&record, &key)?)?;
        }
        Commands::List {
            model,
            locale,
            active_only,
            order_by,
            direction,
            limit,
        } => {
            let mut query = repository.query(&model)?;
            if active_only {
                query = query.with_active_translations(locale.as_deref());
            }
            if let Some(field) = &order_by {
                query = query.order_by_translation(field, direction.into(), locale.as_deref())?;
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            let records = repository.get_async(query).await?;
            let target = repository.locales().resolve_locale(locale.as_deref());
            let resolver = build_resolver(&repository, &config);

            let mut listed = Vec::with_capacity(records.len());
            for record in &records {
                listed.push(json!({
                    "id": record.id,
                    "attributes": record.attributes,
                    "translation": resolver.resolve(record, &target)?,
                }));
            }
            print_json(&listed)?;
        }
        Commands::Stats => {
            let stats = repository.connection().stats(repository.models())?;
            println!("{}", stats);
        }
    }

    Ok(())
}

fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path)
            .with_context(|| format!("Failed to load config file: {}", config_path));
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config
        .save(config_path)
        .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
    Ok(config)
}

fn build_resolver<'a>(repository: &'a Repository, config: &Config) -> TranslationResolver<&'a Repository> {
    TranslationResolver::with_labels(
        repository,
        repository.locales().clone(),
        Arc::new(IsoLanguageLabels::new(config.labels.style())),
    )
}

fn find_record(repository: &Repository, model: &str, id: i64) -> Result<BaseRecord> {
    repository
        .find(model, id)?
        .with_context(|| format!("No {} record with id {}", model, id))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn seed_demo(repository: &Repository) -> Result<()> {
    let model = "pages";
    repository
        .models()
        .require(model)
        .context("The demo needs a translatable 'pages' model")?
        .require_translation()?;

    let pages = [
        (1, "about", [("en", true, "About us"), ("fr", true, "À propos")]),
        (2, "contact", [("en", true, "Contact"), ("fr", false, "Nous joindre")]),
        (3, "press", [("en", false, "Press"), ("de", true, "Presse")]),
    ];

    for (position, slug, rows) in pages {
        let attributes: Attributes = [
            ("position".to_string(), Value::from(position)),
            ("slug".to_string(), Value::from(slug)),
        ]
        .into_iter()
        .collect();
        let id = repository.create_record(model, &attributes)?;

        for (locale, active, title) in rows {
            let translated: Attributes = [("title".to_string(), Value::from(title))]
                .into_iter()
                .collect();
            repository.add_translation(model, id, &TranslationRecord::new(locale, active, translated))?;
        }
        info!("Seeded page #{} ({})", id, slug);
    }

    Ok(())
}
