/// Driver Boundary Module
///
/// This module defines the seam between the connection manager and the
/// native database engines. A `Driver` opens a `DatabaseHandle` for a file
/// path; the handle lists the catalog and runs whole-table reads. Identifier
/// quoting lives here as well, since it depends on the SQL dialect the
/// handle speaks.

use crate::core::db::odbc::OdbcDriver;
use crate::core::db::sqlite::SqliteDriver;
use crate::core::db::table::TableData;
use crate::core::DriverError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Characters Access refuses in object names, plus ASCII control characters.
/// Every name is rejected if the pattern fails to compile.
static ACCESS_IDENTIFIER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\x00-\x1F\x7F\[\]\.!`]+$").ok());

/// The SQL dialect spoken by an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Microsoft Access (Jet/ACE) via ODBC: `[identifier]`
    Access,
    /// SQLite: `"identifier"`
    Sqlite,
}

impl Dialect {
    /// Quotes a table name for use in a query.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidIdentifier` for names that cannot be
    /// represented safely in this dialect.
    pub fn quote_identifier(&self, name: &str) -> Result<String, DriverError> {
        match self {
            Dialect::Access => {
                let allowed = ACCESS_IDENTIFIER
                    .as_ref()
                    .is_some_and(|pattern| pattern.is_match(name));
                if name.starts_with(' ') || !allowed {
                    return Err(DriverError::InvalidIdentifier(name.to_string()));
                }
                Ok(format!("[{}]", name))
            }
            Dialect::Sqlite => {
                if name.is_empty() || name.chars().any(|c| c.is_control()) {
                    return Err(DriverError::InvalidIdentifier(name.to_string()));
                }
                Ok(format!("\"{}\"", name.replace('"', "\"\"")))
            }
        }
    }

    /// Builds the "every column, every row" query for a table.
    pub fn select_all(&self, table: &str) -> Result<String, DriverError> {
        Ok(format!("SELECT * FROM {}", self.quote_identifier(table)?))
    }
}

/// A live connection to one database file.
pub trait DatabaseHandle: Send {
    /// The dialect used to quote identifiers for this handle.
    fn dialect(&self) -> Dialect;

    /// Names of the user tables in the catalog.
    fn table_names(&mut self) -> Result<Vec<String>, DriverError>;

    /// Runs a query and materializes every row it returns.
    fn fetch_all(&mut self, query: &str) -> Result<TableData, DriverError>;
}

/// Opens handles for database files.
pub trait Driver: Send {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    fn open(&self, path: &Path) -> Result<Box<dyn DatabaseHandle>, DriverError>;
}

/// Picks a driver from the file extension: `.accdb`/`.mdb` go through ODBC,
/// everything else through SQLite.
#[derive(Debug, Clone, Default)]
pub struct AutoDriver {
    odbc: OdbcDriver,
    sqlite: SqliteDriver,
}

impl AutoDriver {
    pub fn new(odbc: OdbcDriver) -> Self {
        AutoDriver {
            odbc,
            sqlite: SqliteDriver,
        }
    }

    pub fn driver_for(&self, path: &Path) -> &dyn Driver {
        if is_access_file(path) {
            &self.odbc
        } else {
            &self.sqlite
        }
    }
}

impl Driver for AutoDriver {
    fn name(&self) -> &str {
        "auto"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DatabaseHandle>, DriverError> {
        self.driver_for(path).open(path)
    }
}

/// True for the Access file extensions, compared case-insensitively.
pub fn is_access_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("accdb") || ext.eq_ignore_ascii_case("mdb"))
        .unwrap_or(false)
}
