// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod repl;
pub mod results_grid;
pub mod table_model;
pub mod viewer;
pub mod worker;
