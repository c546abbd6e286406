use crate::core::Result;
use crate::results_grid::ResultsGrid;
use crate::viewer::{OpenReport, SelectReport, Viewer};
use std::io::{BufRead, Write};

/// Represents a parsed REPL command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Open(String),
    Tables,
    Show(String),
    Next,
    Prev,
    Export(String),
    Help,
    Quit,
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as the name of a table to show. Paths and table
/// names take the rest of the line, so they may contain spaces.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let Some(trimmed) = input.strip_prefix(':') else {
        return Command::Show(input.to_string());
    };

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    match (name, rest.is_empty()) {
        ("open", false) => Command::Open(rest.to_string()),
        ("tables", _) => Command::Tables,
        ("show", false) => Command::Show(rest.to_string()),
        ("next", _) => Command::Next,
        ("prev", _) => Command::Prev,
        ("export", false) => Command::Export(rest.to_string()),
        ("help", _) => Command::Help,
        ("quit", _) | ("q", _) => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

const HELP: &str = "\
Available commands:
  :open <path>       - Open a database file (.accdb, .mdb, .db, .sqlite)
  :tables            - List the tables of the open database
  :show <table>      - Display a table (or type the table name alone)
  :next / :prev      - Page through the displayed table
  :export <format>   - Print the displayed table as csv, json or markdown
  :help              - Show this help
  :quit              - Exit";

/// Runs the REPL, reading commands from `input` and writing to `output`
/// until `:quit` or end of input.
///
/// # Errors
///
/// Only I/O errors on `input`/`output` end the loop early; every command
/// error is printed and the loop continues.
pub fn run_repl<R: BufRead, W: Write>(
    viewer: &mut Viewer,
    input: R,
    mut output: W,
    page_rows: usize,
) -> Result<()> {
    writeln!(output, "Welcome to accview! Type :help for commands, :quit to exit.")?;
    let mut grid: Option<ResultsGrid> = viewer
        .current()
        .map(|model| ResultsGrid::new(model.clone(), page_rows));

    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Open(path) => match viewer.open_database(&path) {
                Ok(OpenReport::Connected { tables }) => {
                    grid = None;
                    writeln!(output, "Connected to database successfully!")?;
                    writeln!(output, "Tables: {}", tables.join(", "))?;
                }
                Ok(OpenReport::NoTables) => {
                    grid = None;
                    writeln!(output, "The selected database has no tables.")?;
                }
                Ok(OpenReport::ConnectionFailed { message }) => {
                    grid = None;
                    writeln!(output, "Connection error: {}", message)?;
                }
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::Tables => {
                if !viewer.is_connected() {
                    writeln!(output, "No database connection. Please :open a database first.")?;
                } else {
                    for table in viewer.tables() {
                        writeln!(output, "  {}", table)?;
                    }
                }
            }
            Command::Show(table) => match viewer.select_table(&table) {
                Ok(report) => grid = show_selection(&mut output, viewer, report, page_rows)?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::Next => match grid.as_mut() {
                Some(shown) => {
                    shown.next_page();
                    write!(output, "{}", shown.render()?)?;
                }
                None => writeln!(output, "No table selected.")?,
            },
            Command::Prev => match grid.as_mut() {
                Some(shown) => {
                    shown.prev_page();
                    write!(output, "{}", shown.render()?)?;
                }
                None => writeln!(output, "No table selected.")?,
            },
            Command::Export(format) => match &grid {
                Some(shown) => match shown.export(&format) {
                    Ok(text) => write!(output, "{}", text)?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                },
                None => writeln!(output, "No table selected.")?,
            },
            Command::Unknown(cmd) => {
                writeln!(output, "Unknown command: {}. Type :help for commands.", cmd)?
            }
        }
    }

    Ok(())
}

/// Prints the outcome of a table selection and returns the grid now on
/// display.
pub fn show_selection<W: Write>(
    output: &mut W,
    viewer: &Viewer,
    report: SelectReport,
    page_rows: usize,
) -> Result<Option<ResultsGrid>> {
    let shown = viewer
        .current()
        .map(|model| ResultsGrid::new(model.clone(), page_rows));

    match report {
        SelectReport::Displayed { rows, .. } => {
            if let Some(shown) = &shown {
                write!(output, "{}", shown.render()?)?;
            }
            writeln!(output, "({} rows)", rows)?;
        }
        SelectReport::Empty { .. } => {
            if let Some(shown) = &shown {
                write!(output, "{}", shown.render()?)?;
            }
            writeln!(output, "The selected table is empty.")?;
        }
        SelectReport::Failed { message } => {
            writeln!(output, "Error reading table: {}", message)?;
        }
    }

    Ok(shown)
}
