//! File system storage operations
//!
//! This module handles the per-year output files: creating, appending to,
//! rotating, and reading back `<year>.json` arrays.

mod year_file;

pub use year_file::{YearFileRotator, YearSummary, read_year_file};
