/// SQLite Driver Module
///
/// Opens `.db`/`.sqlite` files through rusqlite. Used for local databases
/// and for exercising the connection manager where no Access ODBC driver is
/// installed.

use crate::core::db::driver::{DatabaseHandle, Dialect, Driver};
use crate::core::db::table::{TableData, Value};
use crate::core::DriverError;
use rusqlite::{types::ValueRef, Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

/// Driver for SQLite database files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Opens an existing file read-only; a missing file is an error rather
    /// than a freshly created database.
    fn open(&self, path: &Path) -> Result<Box<dyn DatabaseHandle>, DriverError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // SQLite opens lazily; touch the schema so a non-database file fails here.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;

        debug!(path = %path.display(), "opened sqlite database");
        Ok(Box::new(SqliteHandle { conn }))
    }
}

/// An open SQLite connection.
#[derive(Debug)]
pub struct SqliteHandle {
    conn: Connection,
}

impl SqliteHandle {
    /// Wraps an already-open connection, e.g. an in-memory database.
    pub fn from_connection(conn: Connection) -> Self {
        SqliteHandle { conn }
    }
}

impl DatabaseHandle for SqliteHandle {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn table_names(&mut self) -> Result<Vec<String>, DriverError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type='table' AND substr(name, 1, 7) <> 'sqlite_'
             ORDER BY rowid",
        )?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names)
    }

    fn fetch_all(&mut self, query: &str) -> Result<TableData, DriverError> {
        let mut stmt = self.conn.prepare(query)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(to_value(row.get_ref(i)?));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        TableData::new(columns, rows).map_err(|e| DriverError::Malformed(e.to_string()))
    }
}

fn to_value(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
