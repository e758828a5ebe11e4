/// Application settings and logging setup
///
/// Settings live in a small JSON file in the user's config directory:
/// - Linux: ~/.config/bookshelf/settings.json
/// - macOS: ~/Library/Application Support/bookshelf/settings.json
/// - Windows: %APPDATA%\bookshelf\settings.json
///
/// A missing file means defaults. Every field is optional.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::state::data::FieldName;
use crate::state::error::LibraryError;

const APP_DIR: &str = "bookshelf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("bad grid column in settings: {0}")]
    Column(#[from] LibraryError),

    #[error("could not determine a data directory for the catalog")]
    NoDataDir,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Catalog file; defaults to `<data_dir>/bookshelf/library.db`
    pub database_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Grid columns, by database column name
    pub columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: "info".to_string(),
            columns: [
                FieldName::Title,
                FieldName::Author,
                FieldName::Genre,
                FieldName::Status,
                FieldName::Rating,
                FieldName::Notes,
            ]
            .iter()
            .map(|name| name.column().to_string())
            .collect(),
        }
    }
}

impl Settings {
    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match dirs::config_dir() {
            Some(mut path) => {
                path.push(APP_DIR);
                path.push("settings.json");
                Self::load_from(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Where the catalog file lives
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(ConfigError::NoDataDir)?;
        path.push(APP_DIR);
        path.push("library.db");
        Ok(path)
    }

    /// Resolve the configured grid columns
    pub fn grid_columns(&self) -> Result<Vec<FieldName>, ConfigError> {
        let columns = self
            .columns
            .iter()
            .map(|name| name.parse::<FieldName>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

/// Install the global `tracing` subscriber.
/// `RUST_LOG` wins over the settings filter.
pub fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.grid_columns().unwrap()[0], FieldName::Title);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "database_path": "/tmp/books.db" }"#).unwrap();
        assert_eq!(settings.database_path().unwrap(), PathBuf::from("/tmp/books.db"));
        assert_eq!(settings.columns, Settings::default().columns);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let settings = Settings::from_json(r#"{ "columns": ["title", "_selected"] }"#).unwrap();
        assert!(matches!(
            settings.grid_columns(),
            Err(ConfigError::Column(LibraryError::InvalidField(name))) if name == "_selected"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&missing).unwrap(), Settings::default());

        std::fs::write(&missing, r#"{ "log_filter": "bookshelf=debug" }"#).unwrap();
        assert_eq!(Settings::load_from(&missing).unwrap().log_filter, "bookshelf=debug");

        std::fs::write(&missing, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&missing), Err(ConfigError::Parse { .. })));
    }
}
