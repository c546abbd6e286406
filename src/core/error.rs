/// Accview Error Module
///
/// This module defines the error types for the accview application.
/// Misuse of the data layer (no path, no connection, bad indices) is
/// reported through `AccviewError`; failures inside a database driver are
/// reported through `DriverError`, which the connection manager absorbs and
/// hands back as a tagged outcome instead of propagating.
use crate::table_model::Axis;
use thiserror::Error;

/// Error type for the accview application.
///
/// This enum covers the conditions that callers are expected to handle:
/// - Configuration problems (no database path, unreadable config file)
/// - Data-layer misuse (fetching before connecting)
/// - Display misuse (cell or header index out of range)
/// - REPL, export, I/O and JSON failures
#[derive(Error, Debug)]
pub enum AccviewError {
    /// Missing or invalid configuration, including "database path not set"
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table listing or read was attempted without a live connection
    #[error("No database connection. Please connect first.")]
    NotConnected,

    /// A driver failure surfaced outside the connection manager
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Tabular data that violates its shape invariants
    #[error("Schema error: {0}")]
    Schema(String),

    /// Cell or header lookup outside the table's dimensions
    #[error("{axis} index {index} out of bounds (len {len})")]
    OutOfBounds { axis: Axis, index: usize, len: usize },

    /// UI-related errors (export formats, display issues)
    #[error("UI error: {0}")]
    Ui(String),

    /// Command validation and execution errors
    #[error("Command error: {0}")]
    Command(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a database driver.
///
/// These never escape the connection manager as `Err`; they travel inside
/// `ConnectOutcome::Failed` and `ReadOutcome::Failed`.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Errors raised by the SQLite engine
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Errors raised by the ODBC driver manager or the Access driver
    #[error("ODBC error: {0}")]
    Odbc(String),

    /// The requested table is not part of the database catalog
    #[error("Table '{0}' does not exist in the database")]
    UnknownTable(String),

    /// The table name cannot be expressed as a quoted identifier
    #[error("Invalid table name '{0}'")]
    InvalidIdentifier(String),

    /// A result set whose shape does not match its column list
    #[error("Malformed result: {0}")]
    Malformed(String),

    /// The driver is not compiled into this build or not installed
    #[error("Driver unavailable: {0}")]
    Unavailable(String),
}

/// Type alias for Result to use AccviewError as the error type.
pub type Result<T> = std::result::Result<T, AccviewError>;
