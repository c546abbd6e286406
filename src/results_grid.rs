use crate::core::db::table::Value;
use crate::core::{AccviewError, Result};
use crate::table_model::{Axis, TableModel};

/// Results Grid Module for accview
///
/// This module renders a `TableModel` as a text grid in the terminal, with a
/// row-number column and a scrolling viewport, and exports the full table as
/// CSV, JSON or Markdown.

use std::ops::Range;

/// Represents the viewport for virtualized scrolling.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub start: usize,
    pub end: usize,
}

impl Viewport {
    pub fn new(start: usize, end: usize) -> Self {
        Viewport { start, end }
    }

    /// Number of rows the viewport shows at once.
    pub fn height(&self) -> usize {
        self.end - self.start
    }

    /// Row indices visible out of `total_rows`.
    pub fn visible_range(&self, total_rows: usize) -> Range<usize> {
        let start = self.start.min(total_rows);
        let end = self.end.min(total_rows);
        start..end
    }

    pub fn scroll_down(&mut self, total_rows: usize) {
        if self.end < total_rows {
            self.start += 1;
            self.end += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        if self.start > 0 {
            self.start -= 1;
            self.end -= 1;
        }
    }

    /// Moves one page forward, stopping with the last row at the bottom.
    pub fn page_down(&mut self, total_rows: usize) {
        let height = self.height();
        let last_start = total_rows.saturating_sub(height);
        self.start = (self.start + height).min(last_start.max(self.start));
        self.end = self.start + height;
    }

    pub fn page_up(&mut self) {
        let height = self.height();
        self.start = self.start.saturating_sub(height);
        self.end = self.start + height;
    }
}

/// Export formats supported by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = AccviewError;

    fn from_str(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(AccviewError::Ui(format!(
                "Unsupported export format: '{}'. Supported formats: csv, json, markdown",
                format
            ))),
        }
    }
}

/// A table model plus the window of rows currently on screen.
#[derive(Debug, Clone)]
pub struct ResultsGrid {
    model: TableModel,
    pub viewport: Viewport,
}

impl ResultsGrid {
    /// Creates a grid showing `page_rows` rows at a time.
    pub fn new(model: TableModel, page_rows: usize) -> Self {
        ResultsGrid {
            model,
            viewport: Viewport::new(0, page_rows.max(1)),
        }
    }

    pub fn model(&self) -> &TableModel {
        &self.model
    }

    pub fn next_page(&mut self) {
        self.viewport.page_down(self.model.row_count());
    }

    pub fn prev_page(&mut self) {
        self.viewport.page_up();
    }

    /// Renders the visible rows with padded columns and a row-number column.
    pub fn render(&self) -> Result<String> {
        let model = &self.model;
        if model.column_count() == 0 {
            return Ok(String::new());
        }

        let visible = self.viewport.visible_range(model.row_count());
        let mut lines: Vec<Vec<String>> = Vec::with_capacity(visible.len() + 1);

        let mut header = vec!["#".to_string()];
        header.extend(model.column_headers().iter().cloned());
        lines.push(header);

        for row in visible {
            let mut line = vec![model.header_at(row, Axis::Row)?];
            for col in 0..model.column_count() {
                line.push(model.cell_at(row, col)?);
            }
            lines.push(line);
        }

        let widths: Vec<usize> = (0..=model.column_count())
            .map(|col| {
                lines
                    .iter()
                    .map(|line| line[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut output = String::new();
        for (i, line) in lines.iter().enumerate() {
            output.push_str(&pad_line(line, &widths));
            output.push('\n');
            if i == 0 {
                let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                output.push_str(&underline.join("-+-"));
                output.push('\n');
            }
        }
        Ok(output)
    }

    /// Exports every row of the table, regardless of the viewport.
    pub fn export(&self, format: &str) -> Result<String> {
        match format.parse::<ExportFormat>()? {
            ExportFormat::Csv => Ok(self.export_to_csv()),
            ExportFormat::Json => self.export_to_json(),
            ExportFormat::Markdown => Ok(self.export_to_markdown()),
        }
    }

    fn export_to_csv(&self) -> String {
        let mut output = String::new();
        if self.model.column_count() == 0 {
            return output;
        }

        let headers: Vec<String> = self.model.column_headers().iter().map(|h| csv_field(h)).collect();
        output.push_str(&headers.join(","));
        output.push('\n');
        for row in self.model.table().rows() {
            let fields: Vec<String> = row.iter().map(|v| csv_field(&v.to_string())).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }

    fn export_to_json(&self) -> Result<String> {
        let headers = self.model.column_headers();
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = self
            .model
            .table()
            .rows()
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(json_value))
                    .collect()
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }

    fn export_to_markdown(&self) -> String {
        let mut output = String::new();
        if self.model.column_count() == 0 {
            return output;
        }

        let headers: Vec<String> = self.model.column_headers().iter().map(|h| markdown_cell(h)).collect();
        output.push_str(&format!("| {} |\n", headers.join(" | ")));
        output.push_str(&format!("|{}|\n", vec![" --- "; headers.len()].join("|")));
        for row in self.model.table().rows() {
            let cells: Vec<String> = row.iter().map(|v| markdown_cell(&v.to_string())).collect();
            output.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        output
    }
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn markdown_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// JSON keeps numbers, booleans and nulls typed; everything else is its display text.
fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(r) => serde_json::Number::from_f64(*r)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(r.to_string())),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        other => serde_json::Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::table::TableData;
    use insta::assert_snapshot;
    use std::sync::Arc;

    fn grid(rows: Vec<Vec<Value>>, page_rows: usize) -> ResultsGrid {
        let table = TableData::new(vec!["Id".to_string(), "Name".to_string()], rows).unwrap();
        ResultsGrid::new(TableModel::new(Arc::new(table)), page_rows)
    }

    fn food_grid() -> ResultsGrid {
        grid(
            vec![
                vec![Value::Integer(1), Value::from("Rice")],
                vec![Value::Integer(2), Value::from("Soup")],
            ],
            10,
        )
    }

    #[test]
    fn test_render_empty_grid() {
        let grid = ResultsGrid::new(TableModel::new(Arc::new(TableData::empty())), 10);
        assert_eq!(grid.render().unwrap(), "");
    }

    #[test]
    fn test_render_with_headers_and_rows() {
        assert_snapshot!(food_grid().render().unwrap(), @r"
        # | Id | Name
        --+----+-----
        0 | 1  | Rice
        1 | 2  | Soup
        ");
    }

    #[test]
    fn test_render_columns_without_rows() {
        let grid = grid(vec![], 10);
        assert_eq!(grid.render().unwrap(), "# | Id | Name\n--+----+-----\n");
    }

    #[test]
    fn test_render_follows_viewport() {
        let rows = (1..=25)
            .map(|i| vec![Value::Integer(i), Value::Text(format!("item{}", i))])
            .collect();
        let mut grid = grid(rows, 10);

        grid.next_page();
        assert_eq!(grid.viewport, Viewport::new(10, 20));
        let rendered = grid.render().unwrap();
        assert!(rendered.contains("10 | 11 | item11"));
        assert!(!rendered.contains("item10\n"));

        grid.next_page();
        assert_eq!(grid.viewport, Viewport::new(15, 25));
        grid.next_page();
        assert_eq!(grid.viewport, Viewport::new(15, 25));

        grid.prev_page();
        grid.prev_page();
        assert_eq!(grid.viewport, Viewport::new(0, 10));
    }

    #[test]
    fn test_viewport_paging_short_table() {
        let mut viewport = Viewport::new(0, 10);
        viewport.page_down(4);
        assert_eq!(viewport, Viewport::new(0, 10));
        assert_eq!(viewport.visible_range(4), 0..4);
    }

    #[test]
    fn test_export_to_csv() {
        let csv = food_grid().export("csv").unwrap();
        assert_eq!(csv, "Id,Name\n1,Rice\n2,Soup\n");
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let grid = grid(
            vec![vec![Value::Integer(1), Value::from("Rice, \"jasmine\"")]],
            10,
        );
        assert_eq!(
            grid.export("csv").unwrap(),
            "Id,Name\n1,\"Rice, \"\"jasmine\"\"\"\n"
        );
    }

    #[test]
    fn test_export_to_json() {
        let grid = grid(
            vec![
                vec![Value::Integer(1), Value::from("Rice")],
                vec![Value::Integer(2), Value::Null],
            ],
            10,
        );
        let json = grid.export("json").unwrap();
        assert_eq!(json, r#"[{"Id":1,"Name":"Rice"},{"Id":2,"Name":null}]"#);
    }

    #[test]
    fn test_export_json_keeps_column_order() {
        let table = TableData::new(
            vec!["Name".to_string(), "Id".to_string()],
            vec![vec![Value::from("Rice"), Value::Integer(1)]],
        )
        .unwrap();
        let grid = ResultsGrid::new(TableModel::new(Arc::new(table)), 10);

        assert_eq!(grid.export("json").unwrap(), r#"[{"Name":"Rice","Id":1}]"#);
    }

    #[test]
    fn test_export_to_markdown() {
        let markdown = food_grid().export("markdown").unwrap();
        assert_eq!(
            markdown,
            "| Id | Name |\n| --- | --- |\n| 1 | Rice |\n| 2 | Soup |\n"
        );
    }

    #[test]
    fn test_export_unsupported_format() {
        let result = food_grid().export("xml");

        if let Err(AccviewError::Ui(msg)) = result {
            assert!(msg.contains("Unsupported export format"));
            assert!(msg.contains("xml"));
        } else {
            panic!("Expected UI error");
        }
    }
}
