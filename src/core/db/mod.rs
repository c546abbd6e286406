/// Database Module
///
/// This module provides the data-access layer for accview, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): owns the database path and the single live handle
/// - **Driver Boundary** (`driver.rs`): the `Driver`/`DatabaseHandle` traits and identifier quoting
/// - **Drivers** (`odbc.rs`, `sqlite.rs`): Access files over ODBC, SQLite files over rusqlite
/// - **Tabular Values** (`table.rs`): the immutable rows-and-columns result of a table read
///
/// ## Error Handling
///
/// Misuse is reported as `AccviewError`. Driver failures are logged and
/// returned as tagged outcomes (`ConnectOutcome`, `ReadOutcome`).
pub mod connection;
pub mod driver;
pub mod odbc;
pub mod sqlite;
pub mod table;

pub use connection::*;
pub use driver::*;
pub use table::*;
