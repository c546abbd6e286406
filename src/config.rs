use crate::core::db::driver::{AutoDriver, Driver};
use crate::core::db::odbc::{OdbcDriver, ACCESS_DRIVER};
use crate::core::db::sqlite::SqliteDriver;
use crate::core::{AccviewError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub grid: GridConfig,
    pub logging: LoggingConfig,
}

/// Which driver opens database files.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ODBC for `.accdb`/`.mdb`, SQLite for everything else
    #[default]
    Auto,
    Odbc,
    Sqlite,
}

/// Database-related configuration.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// ODBC driver name placed in `DRIVER={...}`
    pub odbc_driver: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: Backend::Auto,
            odbc_driver: ACCESS_DRIVER.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Builds the driver selected by this configuration.
    pub fn driver(&self) -> Box<dyn Driver> {
        let odbc = OdbcDriver::new(self.odbc_driver.clone());
        match self.backend {
            Backend::Auto => Box::new(AutoDriver::new(odbc)),
            Backend::Odbc => Box::new(odbc),
            Backend::Sqlite => Box::new(SqliteDriver),
        }
    }
}

/// Grid display configuration.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Rows shown per page in the REPL
    pub viewport_rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { viewport_rows: 20 }
    }
}

/// Logging configuration. `RUST_LOG` takes precedence when set.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Default configuration file location: `<config dir>/accview/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("accview").join("config.toml"))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = accview::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| AccviewError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| AccviewError::Config(format!("invalid config {}: {}", path.display(), e)))
}

/// Loads the given file, or the default location when `path` is `None`.
///
/// A missing default file yields the built-in defaults; an explicitly named
/// file must exist.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => match default_config_path() {
            Some(default) if default.exists() => load_config(default),
            _ => Ok(Config::default()),
        },
    }
}
