//! MCA Company Extractor
//!
//! Pulls company-registration records from the data.gov.in open-data API one
//! registration date at a time and writes them to one JSON array file per
//! calendar year.

pub mod cli;
pub mod client;
pub mod config;
pub mod etl;
pub mod storage;

// Re-exports for convenience
pub use client::{ApiKey, FetchError, Page, PageRequest, RegistryClient};
pub use config::ExtractConfig;
pub use etl::{DateRange, ExtractOptions, Extractor, PageSource, RetryPolicy, RunSummary};
pub use storage::{YearFileRotator, YearSummary};
