/// ODBC Driver Module
///
/// Opens Microsoft Access files (`.accdb`/`.mdb`) through the ODBC driver
/// manager. The connection string is always
/// `DRIVER={<driver name>};DBQ=<path>;`, the contract the Access driver
/// family expects.
///
/// The native binding is compiled only with the `odbc` feature, since it
/// links against the system driver manager. Without it, `open` reports the
/// driver as unavailable and the connection manager treats that like any
/// other connect failure.

use crate::core::db::driver::{DatabaseHandle, Driver};
use crate::core::DriverError;
use std::path::Path;

/// Driver name registered by the Microsoft Access Database Engine.
pub const ACCESS_DRIVER: &str = "Microsoft Access Driver (*.mdb, *.accdb)";

/// Builds the ODBC connection string for a database file.
///
/// A path containing `;` (or starting with `{`) is braced, with any `}`
/// doubled, so the attribute cannot end early.
pub fn connection_string(driver_name: &str, path: &Path) -> String {
    format!("DRIVER={{{}}};DBQ={};", driver_name, attribute_value(&path.display().to_string()))
}

fn attribute_value(value: &str) -> String {
    if value.contains(';') || value.starts_with('{') {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

/// Driver for Access database files over ODBC.
#[derive(Debug, Clone)]
pub struct OdbcDriver {
    driver_name: String,
}

impl OdbcDriver {
    pub fn new(driver_name: impl Into<String>) -> Self {
        OdbcDriver {
            driver_name: driver_name.into(),
        }
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn connection_string(&self, path: &Path) -> String {
        connection_string(&self.driver_name, path)
    }
}

impl Default for OdbcDriver {
    fn default() -> Self {
        OdbcDriver::new(ACCESS_DRIVER)
    }
}

impl Driver for OdbcDriver {
    fn name(&self) -> &str {
        "odbc"
    }

    #[cfg(feature = "odbc")]
    fn open(&self, path: &Path) -> Result<Box<dyn DatabaseHandle>, DriverError> {
        native::open(&self.connection_string(path))
    }

    #[cfg(not(feature = "odbc"))]
    fn open(&self, _path: &Path) -> Result<Box<dyn DatabaseHandle>, DriverError> {
        Err(DriverError::Unavailable(format!(
            "{} (built without the `odbc` feature)",
            self.driver_name
        )))
    }
}

#[cfg(feature = "odbc")]
mod native {
    use crate::core::db::driver::{DatabaseHandle, Dialect};
    use crate::core::db::table::{TableData, Value};
    use crate::core::DriverError;
    use chrono::{NaiveDate, NaiveDateTime};
    use odbc_api::{
        buffers::TextRowSet, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata,
    };
    use once_cell::sync::OnceCell;
    use tracing::debug;

    /// Rows fetched per round trip.
    const BATCH_SIZE: usize = 100;
    /// Upper bound for a single text cell. Longer cells fail the read.
    const MAX_STR_LEN: usize = 65536;

    static ENV: OnceCell<Environment> = OnceCell::new();

    impl From<odbc_api::Error> for DriverError {
        fn from(e: odbc_api::Error) -> Self {
            DriverError::Odbc(e.to_string())
        }
    }

    fn environment() -> Result<&'static Environment, DriverError> {
        ENV.get_or_try_init(Environment::new).map_err(DriverError::from)
    }

    pub(super) fn open(connection_string: &str) -> Result<Box<dyn DatabaseHandle>, DriverError> {
        let env = environment()?;
        let conn = env.connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        debug!(connection_string, "opened odbc connection");
        Ok(Box::new(OdbcHandle { conn }))
    }

    pub struct OdbcHandle {
        conn: odbc_api::Connection<'static>,
    }

    impl DatabaseHandle for OdbcHandle {
        fn dialect(&self) -> Dialect {
            Dialect::Access
        }

        fn table_names(&mut self) -> Result<Vec<String>, DriverError> {
            let cursor = self.conn.tables("", "", "", "TABLE")?;
            // SQLTables: TABLE_CAT, TABLE_SCHEM, TABLE_NAME, TABLE_TYPE, REMARKS
            let rows = read_text(cursor)?;
            Ok(rows
                .into_iter()
                .filter_map(|mut row| row.get_mut(2).and_then(Option::take))
                .collect())
        }

        fn fetch_all(&mut self, query: &str) -> Result<TableData, DriverError> {
            let mut prepared = self.conn.prepare(query)?;
            let Some(mut cursor) = prepared.execute(())? else {
                return Ok(TableData::empty());
            };

            let columns = cursor
                .column_names()?
                .collect::<Result<Vec<String>, _>>()?;
            let mut types = Vec::with_capacity(columns.len());
            for i in 1..=columns.len() {
                types.push(cursor.col_data_type(i as u16)?);
            }

            let rows = read_text(cursor)?
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .zip(&types)
                        .map(|(cell, data_type)| to_value(cell, data_type))
                        .collect()
                })
                .collect();

            TableData::new(columns, rows).map_err(|e| DriverError::Malformed(e.to_string()))
        }
    }

    /// Drains a cursor into rows of optional text cells.
    fn read_text(mut cursor: impl Cursor) -> Result<Vec<Vec<Option<String>>>, DriverError> {
        let buffers = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_STR_LEN))?;
        let mut row_set = cursor.bind_buffer(buffers)?;
        let mut rows = Vec::new();

        while let Some(batch) = row_set.fetch_with_truncation_check(true).map_err(fetch_error)? {
            for row in 0..batch.num_rows() {
                let cells = (0..batch.num_cols())
                    .map(|col| {
                        batch
                            .at(col, row)
                            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    })
                    .collect();
                rows.push(cells);
            }
        }

        Ok(rows)
    }

    fn fetch_error(e: odbc_api::Error) -> DriverError {
        if matches!(e, odbc_api::Error::TooLargeValueForBuffer { .. }) {
            DriverError::Malformed(format!("cell longer than {} bytes: {}", MAX_STR_LEN, e))
        } else {
            e.into()
        }
    }

    /// Recovers a typed value from the driver's text rendering, falling back
    /// to text whenever the column type does not parse.
    fn to_value(cell: Option<String>, data_type: &DataType) -> Value {
        let Some(text) = cell else {
            return Value::Null;
        };

        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                text.trim().parse().map(Value::Integer).unwrap_or(Value::Text(text))
            }
            DataType::Real | DataType::Double | DataType::Float { .. } => {
                text.trim().parse().map(Value::Real).unwrap_or(Value::Text(text))
            }
            DataType::Bit => match text.trim() {
                "1" => Value::Boolean(true),
                "0" => Value::Boolean(false),
                _ => Value::Text(text),
            },
            DataType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Text(text)),
            DataType::Timestamp { .. } => {
                NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f")
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Text(text))
            }
            _ => Value::Text(text),
        }
    }

}
