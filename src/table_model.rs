/// Table Model Module
///
/// Exposes a tabular value to grid widgets through a four-operation
/// contract: dimensions, cell text, column headers and row headers. The
/// model never changes what it shows; displaying different data means
/// building a new model.

use crate::core::db::table::TableData;
use crate::core::{AccviewError, Result};
use std::fmt;
use std::sync::Arc;

/// Header orientation, in grid terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Headers across the top, one per column
    Column,
    /// Headers down the side, one per row
    Row,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Column => f.write_str("column"),
            Axis::Row => f.write_str("row"),
        }
    }
}

/// Read-only grid projection of one tabular value.
#[derive(Debug, Clone)]
pub struct TableModel {
    table: Arc<TableData>,
}

impl TableModel {
    pub fn new(table: Arc<TableData>) -> Self {
        TableModel { table }
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    /// Display text of one cell, formatted at lookup time.
    ///
    /// # Errors
    ///
    /// `AccviewError::OutOfBounds` when `row` or `col` is outside the table.
    pub fn cell_at(&self, row: usize, col: usize) -> Result<String> {
        check_bounds(Axis::Row, row, self.row_count())?;
        check_bounds(Axis::Column, col, self.column_count())?;

        self.table
            .get(row, col)
            .map(ToString::to_string)
            .ok_or(AccviewError::OutOfBounds {
                axis: Axis::Row,
                index: row,
                len: self.row_count(),
            })
    }

    /// Column name for the column axis, ordinal position for the row axis.
    ///
    /// # Errors
    ///
    /// `AccviewError::OutOfBounds` when `index` is outside the axis.
    pub fn header_at(&self, index: usize, axis: Axis) -> Result<String> {
        match axis {
            Axis::Column => {
                check_bounds(axis, index, self.column_count())?;
                Ok(self.table.columns()[index].clone())
            }
            Axis::Row => {
                check_bounds(axis, index, self.row_count())?;
                Ok(index.to_string())
            }
        }
    }

    pub fn column_headers(&self) -> &[String] {
        self.table.columns()
    }

    /// The shared tabular value behind this model.
    pub fn table(&self) -> &Arc<TableData> {
        &self.table
    }
}

fn check_bounds(axis: Axis, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(AccviewError::OutOfBounds { axis, index, len })
    }
}
