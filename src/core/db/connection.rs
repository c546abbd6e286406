/// Connection Management Module
///
/// This module provides the connection manager: it owns the path of one
/// database file and at most one live handle to it, lists the tables in the
/// catalog, and reads whole tables into `TableData`.
///
/// Misuse (connecting without a path, reading without a connection) fails
/// loudly with `AccviewError`. Driver failures are logged and returned as
/// `ConnectOutcome::Failed` / `ReadOutcome::Failed`, never as `Err`.

use crate::core::db::driver::{DatabaseHandle, Driver};
use crate::core::db::table::TableData;
use crate::core::{AccviewError, DriverError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of a connect attempt that got as far as the driver.
#[derive(Debug)]
#[must_use]
pub enum ConnectOutcome {
    /// A handle is open and held by the manager
    Connected,
    /// The driver could not open the file; the manager holds no handle
    Failed(DriverError),
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected)
    }
}

/// Result of reading a table.
///
/// A zero-row table and a failed read are distinct outcomes so callers can
/// present them differently.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// The table returned at least one row
    Loaded(Arc<TableData>),
    /// The table exists but returned no rows; its columns are still known
    Empty(Arc<TableData>),
    /// The read failed; the error has already been logged
    Failed { table: String, error: Arc<DriverError> },
}

impl ReadOutcome {
    /// The tabular value to display. Failed reads yield an empty value.
    pub fn table(&self) -> Arc<TableData> {
        match self {
            ReadOutcome::Loaded(table) | ReadOutcome::Empty(table) => Arc::clone(table),
            ReadOutcome::Failed { .. } => Arc::new(TableData::empty()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ReadOutcome::Failed { .. })
    }
}

/// Connection manager for a single database file
pub struct ConnectionManager {
    driver: Box<dyn Driver>,
    path: Option<PathBuf>,
    /// Active handle (None if disconnected or the last connect failed)
    handle: Option<Box<dyn DatabaseHandle>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("driver", &self.driver.name())
            .field("path", &self.path)
            .field("connected", &self.handle.is_some())
            .finish()
    }
}

impl ConnectionManager {
    /// Creates a manager with no path and no connection
    pub fn new(driver: Box<dyn Driver>) -> Self {
        ConnectionManager {
            driver,
            path: None,
            handle: None,
        }
    }

    /// Stores the database path. Does not connect and does not touch any
    /// open handle; the next `connect` replaces it.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Opens a connection to the stored path, replacing any prior handle.
    ///
    /// # Returns
    ///
    /// `Ok(ConnectOutcome::Connected)` when the driver opened the file,
    /// `Ok(ConnectOutcome::Failed(_))` when it did not. A failed connect
    /// leaves the manager disconnected.
    ///
    /// # Errors
    ///
    /// `AccviewError::Config` when no path (or an empty path) has been set.
    /// The driver is not called in that case.
    pub fn connect(&mut self) -> Result<ConnectOutcome> {
        let path = match self.path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
            _ => return Err(AccviewError::Config("database path not set".to_string())),
        };

        // Release the previous handle before the driver opens a new one.
        self.handle = None;

        match self.driver.open(&path) {
            Ok(handle) => {
                info!(path = %path.display(), driver = self.driver.name(), "Connected to the database successfully");
                self.handle = Some(handle);
                Ok(ConnectOutcome::Connected)
            }
            Err(e) => {
                error!(path = %path.display(), driver = self.driver.name(), error = %e, "Error connecting to database");
                Ok(ConnectOutcome::Failed(e))
            }
        }
    }

    /// Closes the current connection, if any
    pub fn disconnect(&mut self) {
        if self.handle.take().is_some() {
            debug!("database connection closed");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Lists the user tables of the connected database, each name once.
    ///
    /// A catalog failure is logged and yields an empty list.
    ///
    /// # Errors
    ///
    /// `AccviewError::NotConnected` without a live connection.
    pub fn list_tables(&mut self) -> Result<Vec<String>> {
        let handle = self.handle.as_mut().ok_or(AccviewError::NotConnected)?;

        match handle.table_names() {
            Ok(names) => Ok(dedup_preserving_order(names)),
            Err(e) => {
                warn!(error = %e, "Fetching tables failed");
                Ok(Vec::new())
            }
        }
    }

    /// Reads every column and row of `name`.
    ///
    /// The name must appear in the catalog; it is quoted for the handle's
    /// dialect before it reaches the query. Driver failures, including
    /// unknown or malformed names, are logged and returned as
    /// `ReadOutcome::Failed`.
    ///
    /// # Errors
    ///
    /// `AccviewError::NotConnected` without a live connection.
    pub fn read_table(&mut self, name: &str) -> Result<ReadOutcome> {
        let handle = self.handle.as_mut().ok_or(AccviewError::NotConnected)?;

        match fetch_table(handle.as_mut(), name) {
            Ok(table) if table.is_empty() => {
                info!(table = name, columns = table.column_count(), "table has no rows");
                Ok(ReadOutcome::Empty(Arc::new(table)))
            }
            Ok(table) => {
                debug!(table = name, rows = table.row_count(), "table loaded");
                Ok(ReadOutcome::Loaded(Arc::new(table)))
            }
            Err(e) => {
                error!(table = name, error = %e, "Error reading table");
                Ok(ReadOutcome::Failed {
                    table: name.to_string(),
                    error: Arc::new(e),
                })
            }
        }
    }
}

fn fetch_table(handle: &mut dyn DatabaseHandle, name: &str) -> std::result::Result<TableData, DriverError> {
    let catalog = handle.table_names()?;
    let resolved = resolve_table_name(&catalog, name)
        .ok_or_else(|| DriverError::UnknownTable(name.to_string()))?;

    let query = handle.dialect().select_all(resolved)?;
    debug!(%query, "reading table");
    handle.fetch_all(&query)
}

/// Finds `name` in the catalog: exact match first, then a unique
/// case-insensitive match (Access treats object names case-insensitively).
fn resolve_table_name<'a>(catalog: &'a [String], name: &str) -> Option<&'a str> {
    if let Some(exact) = catalog.iter().find(|t| t.as_str() == name) {
        return Some(exact);
    }

    let mut folded = catalog.iter().filter(|t| t.eq_ignore_ascii_case(name));
    match (folded.next(), folded.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::driver::Dialect;
    use crate::core::db::table::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory catalog shared by the fake driver and its handles.
    #[derive(Default)]
    struct FakeCatalog {
        tables: Vec<(String, TableData)>,
        fail_catalog: bool,
        queries: Vec<String>,
    }

    struct FakeDriver {
        catalog: Arc<Mutex<FakeCatalog>>,
        opens: Arc<AtomicUsize>,
        fail_open: bool,
    }

    struct FakeHandle {
        catalog: Arc<Mutex<FakeCatalog>>,
    }

    impl Driver for FakeDriver {
        fn name(&self) -> &str {
            "fake"
        }

        fn open(&self, path: &Path) -> std::result::Result<Box<dyn DatabaseHandle>, DriverError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(DriverError::Odbc(format!("cannot open {}", path.display())));
            }
            Ok(Box::new(FakeHandle {
                catalog: Arc::clone(&self.catalog),
            }))
        }
    }

    impl DatabaseHandle for FakeHandle {
        fn dialect(&self) -> Dialect {
            Dialect::Access
        }

        fn table_names(&mut self) -> std::result::Result<Vec<String>, DriverError> {
            let catalog = self.catalog.lock().unwrap();
            if catalog.fail_catalog {
                return Err(DriverError::Odbc("catalog unavailable".to_string()));
            }
            Ok(catalog.tables.iter().map(|(name, _)| name.clone()).collect())
        }

        fn fetch_all(&mut self, query: &str) -> std::result::Result<TableData, DriverError> {
            let mut catalog = self.catalog.lock().unwrap();
            catalog.queries.push(query.to_string());
            catalog
                .tables
                .iter()
                .find(|(name, _)| query == format!("SELECT * FROM [{}]", name))
                .map(|(_, table)| table.clone())
                .ok_or_else(|| DriverError::Odbc(format!("bad query {}", query)))
        }
    }

    struct Fixture {
        manager: ConnectionManager,
        catalog: Arc<Mutex<FakeCatalog>>,
        opens: Arc<AtomicUsize>,
    }

    fn fixture(fail_open: bool) -> Fixture {
        let food = TableData::new(
            vec!["Id".to_string(), "Name".to_string()],
            vec![
                vec![Value::Integer(1), Value::from("Rice")],
                vec![Value::Integer(2), Value::from("Soup")],
            ],
        )
        .unwrap();
        let empty = TableData::new(vec!["Shelf".to_string()], vec![]).unwrap();

        let catalog = Arc::new(Mutex::new(FakeCatalog {
            tables: vec![("Food".to_string(), food), ("Pantry".to_string(), empty)],
            ..Default::default()
        }));
        let opens = Arc::new(AtomicUsize::new(0));
        let driver = FakeDriver {
            catalog: Arc::clone(&catalog),
            opens: Arc::clone(&opens),
            fail_open,
        };

        Fixture {
            manager: ConnectionManager::new(Box::new(driver)),
            catalog,
            opens,
        }
    }

    #[test]
    fn test_connect_without_path_never_calls_driver() {
        let mut fx = fixture(false);

        match fx.manager.connect() {
            Err(AccviewError::Config(msg)) => assert!(msg.contains("path not set")),
            other => panic!("Expected Config error, got {:?}", other),
        }

        fx.manager.set_path("");
        assert!(matches!(fx.manager.connect(), Err(AccviewError::Config(_))));
        assert_eq!(fx.opens.load(Ordering::SeqCst), 0);
        assert!(!fx.manager.is_connected());
    }

    #[test]
    fn test_set_path_does_not_connect() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");

        assert_eq!(fx.manager.path(), Some(Path::new("Kitchen.accdb")));
        assert!(!fx.manager.is_connected());
        assert_eq!(fx.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetching_before_connect_fails_loudly() {
        let mut fx = fixture(false);
        assert!(matches!(fx.manager.list_tables(), Err(AccviewError::NotConnected)));
        assert!(matches!(fx.manager.read_table("Food"), Err(AccviewError::NotConnected)));
    }

    #[test]
    fn test_failed_connect_leaves_manager_disconnected() {
        let mut fx = fixture(true);
        fx.manager.set_path("Kitchen.accdb");

        let outcome = fx.manager.connect().unwrap();
        match outcome {
            ConnectOutcome::Failed(DriverError::Odbc(msg)) => assert!(msg.contains("Kitchen.accdb")),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert!(!fx.manager.is_connected());
        assert!(matches!(fx.manager.list_tables(), Err(AccviewError::NotConnected)));
    }

    #[test]
    fn test_reconnect_replaces_handle() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        assert!(fx.manager.connect().unwrap().is_connected());

        fx.manager.set_path("Cellar.accdb");
        assert!(fx.manager.is_connected(), "set_path alone keeps the old handle");
        assert!(fx.manager.connect().unwrap().is_connected());
        assert_eq!(fx.opens.load(Ordering::SeqCst), 2);

        fx.manager.disconnect();
        assert!(!fx.manager.is_connected());
    }

    #[test]
    fn test_list_tables() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();

        assert_eq!(fx.manager.list_tables().unwrap(), vec!["Food", "Pantry"]);
    }

    #[test]
    fn test_list_tables_catalog_failure_is_empty() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();
        fx.catalog.lock().unwrap().fail_catalog = true;

        assert!(fx.manager.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_read_table_loaded() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();

        match fx.manager.read_table("Food").unwrap() {
            ReadOutcome::Loaded(table) => {
                assert_eq!(table.columns(), &["Id", "Name"]);
                assert_eq!(table.rows()[1], vec![Value::Integer(2), Value::from("Soup")]);
            }
            other => panic!("Expected Loaded, got {:?}", other),
        }
        assert_eq!(fx.catalog.lock().unwrap().queries, vec!["SELECT * FROM [Food]"]);
    }

    #[test]
    fn test_read_table_case_insensitive_uses_catalog_spelling() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();

        let outcome = fx.manager.read_table("food").unwrap();
        assert!(matches!(outcome, ReadOutcome::Loaded(_)));
        assert_eq!(fx.catalog.lock().unwrap().queries, vec!["SELECT * FROM [Food]"]);
    }

    #[test]
    fn test_read_table_empty_is_distinct_from_failure() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();

        match fx.manager.read_table("Pantry").unwrap() {
            ReadOutcome::Empty(table) => {
                assert_eq!(table.row_count(), 0);
                assert_eq!(table.columns(), &["Shelf"]);
            }
            other => panic!("Expected Empty, got {:?}", other),
        }
    }

    #[test]
    fn test_read_unknown_or_injected_table_fails_soft() {
        let mut fx = fixture(false);
        fx.manager.set_path("Kitchen.accdb");
        let _ = fx.manager.connect().unwrap();

        for name in ["Nope", "Food; DROP TABLE Food", "Food]"] {
            let outcome = fx.manager.read_table(name).unwrap();
            match &outcome {
                ReadOutcome::Failed { table, error } => {
                    assert_eq!(table, name);
                    assert!(matches!(**error, DriverError::UnknownTable(_)));
                }
                other => panic!("Expected Failed, got {:?}", other),
            }
            assert_eq!(outcome.table().row_count(), 0);
            assert_eq!(outcome.table().column_count(), 0);
        }
        assert!(fx.catalog.lock().unwrap().queries.is_empty());
    }

    #[test]
    fn test_resolve_table_name() {
        let catalog = vec!["Food".to_string(), "food".to_string(), "Pantry".to_string()];
        assert_eq!(resolve_table_name(&catalog, "food"), Some("food"));
        assert_eq!(resolve_table_name(&catalog, "FOOD"), None, "ambiguous fold");
        assert_eq!(resolve_table_name(&catalog, "pantry"), Some("Pantry"));
        assert_eq!(resolve_table_name(&catalog, "Cellar"), None);
    }

    #[test]
    fn test_dedup_preserving_order() {
        let names = vec!["B".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(dedup_preserving_order(names), vec!["B", "A"]);
    }
}
