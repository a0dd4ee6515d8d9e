use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for a migration run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string for the content source.
    pub database_url: String,
    /// Fully qualified table holding the parent content records.
    pub content_table: String,
    /// SQL predicate selecting which content rows are migrated.
    pub content_filter: String,
    /// Optional column used to order content rows for a stable iteration order.
    pub content_order_by: Option<String>,
    /// Table holding the ordered child chunks.
    pub chunk_table: String,
    /// Column in the chunk table referencing the parent content id.
    pub chunk_parent_column: String,
    /// SQL predicate selecting which chunk rows are assembled.
    pub chunk_filter: String,
    /// Firestore project that receives the documents.
    pub firestore_project: String,
    /// Firestore database name within the project.
    pub firestore_database: String,
    /// Base URL of the Firestore REST endpoint (or emulator).
    pub firestore_url: String,
    /// Optional bearer token attached to Firestore requests.
    pub firestore_access_token: Option<String>,
    /// Collection receiving the search documents.
    pub search_collection: String,
    /// Collection receiving the content documents.
    pub content_collection: String,
    /// Number of written rows between progress log lines.
    pub progress_interval: u64,
    /// Maximum number of rows processed concurrently.
    pub concurrency: usize,
    /// File receiving a copy of the logs; `None` selects the default under `logs/`.
    pub log_file: Option<PathBuf>,
}

const DEFAULT_CONTENT_TABLE: &str = "public.content";
const DEFAULT_CONTENT_FILTER: &str = "NOT question AND NOT archived";
const DEFAULT_CONTENT_ORDER_BY: &str = "id";
const DEFAULT_CHUNK_TABLE: &str = "content_chunks";
const DEFAULT_CHUNK_PARENT_COLUMN: &str = "content_id";
const DEFAULT_CHUNK_FILTER: &str = "NOT archived";
const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_SEARCH_COLLECTION: &str = "search";
const DEFAULT_CONTENT_COLLECTION: &str = "content";
const DEFAULT_PROGRESS_INTERVAL: u64 = 100;
const DEFAULT_CONCURRENCY: usize = 1;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map so they never mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or_default =
            |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let content_order_by = match lookup("CONTENT_ORDER_BY") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
            None => Some(DEFAULT_CONTENT_ORDER_BY.to_string()),
        };

        let progress_interval = optional("MIGRATION_PROGRESS_INTERVAL")
            .map(|value| parse_positive::<u64>("MIGRATION_PROGRESS_INTERVAL", &value))
            .transpose()?
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL);
        let concurrency = optional("MIGRATION_CONCURRENCY")
            .map(|value| parse_positive::<usize>("MIGRATION_CONCURRENCY", &value))
            .transpose()?
            .unwrap_or(DEFAULT_CONCURRENCY);

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            content_table: or_default("CONTENT_TABLE", DEFAULT_CONTENT_TABLE),
            content_filter: or_default("CONTENT_FILTER", DEFAULT_CONTENT_FILTER),
            content_order_by,
            chunk_table: or_default("CHUNK_TABLE", DEFAULT_CHUNK_TABLE),
            chunk_parent_column: or_default("CHUNK_PARENT_COLUMN", DEFAULT_CHUNK_PARENT_COLUMN),
            chunk_filter: or_default("CHUNK_FILTER", DEFAULT_CHUNK_FILTER),
            firestore_project: required("FIRESTORE_PROJECT")?,
            firestore_database: or_default("FIRESTORE_DATABASE", DEFAULT_FIRESTORE_DATABASE),
            firestore_url: or_default("FIRESTORE_URL", DEFAULT_FIRESTORE_URL),
            firestore_access_token: optional("FIRESTORE_ACCESS_TOKEN"),
            search_collection: or_default("SEARCH_COLLECTION", DEFAULT_SEARCH_COLLECTION),
            content_collection: or_default("CONTENT_COLLECTION", DEFAULT_CONTENT_COLLECTION),
            progress_interval,
            concurrency,
            log_file: optional("MIGRATE_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
    if parsed <= T::default() {
        return Err(ConfigError::InvalidValue(key.to_string()));
    }
    Ok(parsed)
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// A second call keeps the configuration installed first.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    install(Config::from_env()?);
    Ok(())
}

fn install(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/content"),
        ("FIRESTORE_PROJECT", "maths"),
    ];

    #[test]
    fn applies_defaults_when_only_required_values_present() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("config");
        assert_eq!(config.content_table, "public.content");
        assert_eq!(config.content_filter, "NOT question AND NOT archived");
        assert_eq!(config.content_order_by.as_deref(), Some("id"));
        assert_eq!(config.chunk_parent_column, "content_id");
        assert_eq!(config.firestore_database, "(default)");
        assert_eq!(config.search_collection, "search");
        assert_eq!(config.content_collection, "content");
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.concurrency, 1);
        assert!(config.firestore_access_token.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn log_file_is_read_from_the_environment() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MIGRATE_LOG_FILE", "/var/log/migrate.log"));
        let config = Config::from_lookup(lookup_from(&pairs)).expect("config");
        assert_eq!(
            config.log_file.as_deref(),
            Some(std::path::Path::new("/var/log/migrate.log"))
        );
    }

    #[test]
    fn installed_config_is_served_by_get_config() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("config");
        let installed = install(config);
        assert_eq!(installed.firestore_project, "maths");
        assert!(std::ptr::eq(installed, get_config()));
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("FIRESTORE_PROJECT", "maths")]))
            .expect_err("missing url");
        assert!(matches!(
            err,
            ConfigError::MissingVariable(key) if key == "DATABASE_URL"
        ));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MIGRATION_CONCURRENCY", "0"));
        let err = Config::from_lookup(lookup_from(&pairs)).expect_err("zero");
        assert!(matches!(
            err,
            ConfigError::InvalidValue(key) if key == "MIGRATION_CONCURRENCY"
        ));
    }

    #[test]
    fn empty_order_by_disables_ordering() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CONTENT_ORDER_BY", ""));
        pairs.push(("MIGRATION_PROGRESS_INTERVAL", "25"));
        let config = Config::from_lookup(lookup_from(&pairs)).expect("config");
        assert!(config.content_order_by.is_none());
        assert_eq!(config.progress_interval, 25);
    }
}
