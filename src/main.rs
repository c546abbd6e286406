//! accview - view the tables of a desktop database file from the terminal.
//!
//! Usage:
//!   accview                                   # interactive, :open a file later
//!   accview Kitchen.accdb                     # open a file, then interactive
//!   accview Kitchen.accdb -t Food             # open and show a table, then interactive
//!   accview Kitchen.accdb -t Food -e csv      # print a table as CSV and exit

use accview::config::{self, Backend};
use accview::core::{AccviewError, Result};
use accview::core::db::ConnectionManager;
use accview::repl;
use accview::results_grid::ResultsGrid;
use accview::viewer::{OpenReport, SelectReport, Viewer};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Terminal viewer for Access and SQLite database tables.
#[derive(Parser)]
#[command(name = "accview", version, about = "Desktop database table viewer")]
struct Args {
    /// Database file to open (.accdb, .mdb, .db, .sqlite)
    #[arg(value_name = "DATABASE")]
    database: Option<PathBuf>,

    /// Table to display after opening the database
    #[arg(short, long, value_name = "TABLE", requires = "database")]
    table: Option<String>,

    /// Print the table in this format (csv, json, markdown) and exit
    #[arg(short, long, value_name = "FORMAT", requires = "table")]
    export: Option<String>,

    /// Driver used to open the file (overrides the config file)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match config::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(backend) = args.backend {
        config.database.backend = backend;
    }

    // Logs go to stderr so exported tables on stdout stay clean.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("Starting accview...");

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "accview failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, config: config::Config) -> Result<()> {
    let mut viewer = Viewer::new(ConnectionManager::new(config.database.driver()));
    let page_rows = config.grid.viewport_rows;

    if let Some(path) = &args.database {
        match viewer.open_database(path)? {
            OpenReport::Connected { tables } => {
                info!(path = %path.display(), tables = tables.len(), "database opened")
            }
            OpenReport::NoTables => eprintln!("The selected database has no tables."),
            OpenReport::ConnectionFailed { message } => {
                if args.export.is_some() {
                    return Err(AccviewError::Command(format!("Connection error: {}", message)));
                }
                eprintln!("Connection error: {}", message);
            }
        }
    }

    if let Some(table) = &args.table {
        if viewer.is_connected() {
            let report = viewer.select_table(table)?;
            match &args.export {
                Some(format) => return export_table(&viewer, report, format, page_rows),
                None => {
                    repl::show_selection(&mut io::stdout(), &viewer, report, page_rows)?;
                }
            }
        }
    }

    let stdin = io::stdin();
    repl::run_repl(&mut viewer, stdin.lock(), io::stdout(), page_rows)
}

fn export_table(viewer: &Viewer, report: SelectReport, format: &str, page_rows: usize) -> Result<()> {
    if let SelectReport::Failed { message } = report {
        return Err(AccviewError::Command(format!("Error reading table: {}", message)));
    }

    let model = viewer
        .current()
        .ok_or_else(|| AccviewError::Command("no table selected".to_string()))?;
    let grid = ResultsGrid::new(model.clone(), page_rows);
    print!("{}", grid.export(format)?);
    Ok(())
}
