//! Process settings from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Registry JSON file; the built-in registry is used when unset.
    pub resources_path: Option<PathBuf>,
    pub import_max_rows: usize,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/lexicon".into(),
            bind_addr: "0.0.0.0:3000".into(),
            db_max_connections: 5,
            resources_path: None,
            import_max_rows: 5000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Load(format!("{} must be a number, got '{}'", key, raw))),
        _ => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            resources_path: lookup("RESOURCES_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            import_max_rows: parsed(&lookup, "IMPORT_MAX_ROWS", defaults.import_max_rows)?,
            max_body_bytes: parsed(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }
}
