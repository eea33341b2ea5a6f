//! Core extraction abstractions
//!
//! This module provides the day-by-day pagination engine and the pieces it
//! is built from: the [`PageSource`] seam to the remote API, the
//! [`RetryPolicy`] guarding every page request, and the [`DateRange`] driver.

mod dates;
mod extractor;
mod retry;
mod source;

pub use dates::{DateIter, DateRange};
pub use extractor::{DateOutcome, ExtractOptions, Extractor, RunState, RunSummary};
pub use retry::{Backoff, RetryPolicy};
pub use source::PageSource;
