/// Viewer Session Module
///
/// The state behind the "pick a file, pick a table, look at the grid" flow.
/// A `Viewer` owns the connection manager, the table list of the open
/// database, and the model currently on display. Selecting a table never
/// mutates the displayed model; it replaces it with a new one.

use crate::core::db::connection::{ConnectOutcome, ConnectionManager, ReadOutcome};
use crate::core::Result;
use crate::table_model::TableModel;
use std::path::PathBuf;
use tracing::warn;

/// What happened when a database file was opened.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenReport {
    /// Connected, with at least one table to choose from
    Connected { tables: Vec<String> },
    /// Connected, but the catalog is empty
    NoTables,
    /// The driver refused the file
    ConnectionFailed { message: String },
}

/// What happened when a table was selected.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectReport {
    Displayed { rows: usize, columns: usize },
    /// The table exists but has no rows
    Empty { columns: usize },
    /// The read failed; an empty grid is on display
    Failed { message: String },
}

/// Session state of the table viewer.
#[derive(Debug)]
pub struct Viewer {
    manager: ConnectionManager,
    tables: Vec<String>,
    current: Option<TableModel>,
}

impl Viewer {
    pub fn new(manager: ConnectionManager) -> Self {
        Viewer {
            manager,
            tables: Vec::new(),
            current: None,
        }
    }

    /// Points the session at a new database file and loads its table list.
    ///
    /// The previous table list and grid are cleared either way.
    ///
    /// # Errors
    ///
    /// Propagates `Config` (empty path) and `NotConnected` from the manager.
    pub fn open_database(&mut self, path: impl Into<PathBuf>) -> Result<OpenReport> {
        self.tables.clear();
        self.current = None;

        self.manager.set_path(path);
        match self.manager.connect()? {
            ConnectOutcome::Failed(e) => Ok(OpenReport::ConnectionFailed {
                message: e.to_string(),
            }),
            ConnectOutcome::Connected => {
                self.tables = self.manager.list_tables()?;
                if self.tables.is_empty() {
                    warn!("The selected database has no tables");
                    Ok(OpenReport::NoTables)
                } else {
                    Ok(OpenReport::Connected {
                        tables: self.tables.clone(),
                    })
                }
            }
        }
    }

    /// Reads `name` and puts it on display.
    ///
    /// # Errors
    ///
    /// `NotConnected` when no database is open.
    pub fn select_table(&mut self, name: &str) -> Result<SelectReport> {
        let outcome = self.manager.read_table(name)?;
        let model = TableModel::new(outcome.table());

        let report = match &outcome {
            ReadOutcome::Loaded(table) => SelectReport::Displayed {
                rows: table.row_count(),
                columns: table.column_count(),
            },
            ReadOutcome::Empty(table) => SelectReport::Empty {
                columns: table.column_count(),
            },
            ReadOutcome::Failed { error, .. } => SelectReport::Failed {
                message: error.to_string(),
            },
        };

        self.current = Some(model);
        Ok(report)
    }

    /// Tables of the open database, as listed when it was opened.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// The model on display, if a table has been selected.
    pub fn current(&self) -> Option<&TableModel> {
        self.current.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}
