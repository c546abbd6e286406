/// Core Module for accview
///
/// This module contains the data layer of the application: the database
/// drivers, the connection manager, the tabular value they produce, and the
/// shared error types.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{AccviewError, DriverError, Result};
