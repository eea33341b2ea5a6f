//! Day-by-day pagination engine
//!
//! For every date in a [`DateRange`] the extractor pages through the
//! exact-date query until the API returns an empty page or the next page
//! would fall outside the API's maximum result window. Every page request
//! goes through the [`RetryPolicy`]; records are appended to the open year
//! file as soon as a page arrives.

use super::{DateRange, PageSource, RetryPolicy};
use crate::client::{Page, PageRequest};
use crate::storage::{YearFileRotator, YearSummary};

use chrono::{Datelike, NaiveDate};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Tunables for the pagination loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Records requested per page (`limit`).
    pub page_size: u64,
    /// Deepest `offset + limit` the API serves for one filter.
    pub max_result_window: u64,
    /// Pause between successful page requests.
    pub request_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_result_window: 10_000,
            request_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Counters threaded through the date loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    /// Records written so far across the whole run.
    pub processed: u64,
    /// Most recent advisory total reported by the API.
    pub last_total: Option<u64>,
    /// Dates paged, including those cut short by the result window.
    pub days: usize,
    /// Dates cut short by the result window.
    pub truncated_days: Vec<NaiveDate>,
    /// Dates whose advisory total exceeded what the API handed out.
    pub short_days: usize,
}

impl RunState {
    fn record(&mut self, outcome: &DateOutcome) {
        self.days += 1;
        if outcome.truncated {
            self.truncated_days.push(outcome.date);
        } else if outcome.shortfall().is_some() {
            self.short_days += 1;
        }
    }
}

/// Result of paging a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOutcome {
    pub date: NaiveDate,
    pub records: u64,
    pub pages: u32,
    /// Advisory total for this date, if any page reported one.
    pub total: Option<u64>,
    /// Paging stopped at the result window rather than an empty page.
    pub truncated: bool,
}

impl DateOutcome {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            records: 0,
            pages: 0,
            total: None,
            truncated: false,
        }
    }

    /// Records the API claimed but never returned.
    pub fn shortfall(&self) -> Option<u64> {
        self.total
            .filter(|total| *total > self.records)
            .map(|total| total - self.records)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub range: DateRange,
    pub processed: u64,
    pub last_total: Option<u64>,
    pub days: usize,
    pub truncated_days: Vec<NaiveDate>,
    pub short_days: usize,
    pub years: Vec<YearSummary>,
}

impl RunSummary {
    /// The last advisory total exceeds what was written.
    pub fn possibly_incomplete(&self) -> bool {
        matches!(self.last_total, Some(total) if total > 0 && self.processed < total)
    }

    fn log(&self) {
        log::info!(
            "Saved {}/{} records across {}-{} files",
            self.processed,
            total_label(self.last_total),
            self.range.start().year(),
            self.range.end().year()
        );
        for year in &self.years {
            log::info!(
                "  {} {} record(s)",
                year.path.display().bright_black(),
                year.records
            );
        }
        if !self.truncated_days.is_empty() {
            log::warn!(
                "{} date(s) reached the max result window and may be missing records",
                self.truncated_days.len()
            );
        }
        if self.short_days > 0 {
            log::warn!(
                "{} date(s) returned fewer records than the API's advisory total",
                self.short_days
            );
        }
        if self.possibly_incomplete() {
            log::warn!(
                "Some records may be missing due to max_result_window limit. Check if additional filters are supported by the API."
            );
        }
    }
}

fn total_label(total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => total.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Drives a [`PageSource`] over a range of dates into per-year files.
///
/// # Example
/// ```no_run
/// use mca_company_extractor::client::{ApiKey, RegistryClient};
/// use mca_company_extractor::etl::{DateRange, ExtractOptions, Extractor};
/// use mca_company_extractor::storage::YearFileRotator;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://api.data.gov.in/resource/ec58dab7-d891-4abb-936e-d5d274a6ce9b")?;
/// let client = RegistryClient::try_new(url, ApiKey::new("my-key"), None)?;
/// let extractor = Extractor::new(client, ExtractOptions::default());
///
/// let mut rotator = YearFileRotator::new(".")?;
/// let summary = extractor.run(DateRange::years(2014, 2024)?, &mut rotator).await?;
/// println!("Wrote {} records", summary.processed);
/// # Ok(())
/// # }
/// ```
pub struct Extractor<S> {
    source: S,
    options: ExtractOptions,
}

impl<S: PageSource> Extractor<S> {
    pub fn new(source: S, options: ExtractOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Extract every date in `range`, one year file per calendar year.
    ///
    /// On an error that escapes the retry policy (filesystem failure, an
    /// exhausted bounded policy) the open year file is still closed before
    /// the error is returned.
    ///
    /// # Errors
    /// Returns an error if writing output fails or a bounded retry policy
    /// gives up on a page
    pub async fn run(&self, range: DateRange, rotator: &mut YearFileRotator) -> Result<RunSummary> {
        log::info!(
            "Extracting {} day(s) from {} to {}",
            range.len(),
            range.start().cyan(),
            range.end().cyan()
        );

        let mut state = RunState::default();
        if let Err(e) = self.run_dates(range, rotator, &mut state).await {
            log::error!("Unexpected error: {:#}", e);
            if let Err(close_err) = rotator.close_current() {
                log::error!("Failed to close year file: {:#}", close_err);
            }
            return Err(e);
        }

        let summary = RunSummary {
            range,
            processed: state.processed,
            last_total: state.last_total,
            days: state.days,
            truncated_days: state.truncated_days,
            short_days: state.short_days,
            years: rotator.finish()?,
        };
        summary.log();

        Ok(summary)
    }

    async fn run_dates(
        &self,
        range: DateRange,
        rotator: &mut YearFileRotator,
        state: &mut RunState,
    ) -> Result<()> {
        for date in range {
            rotator.ensure_year(date.year())?;
            let outcome = self.extract_date(date, rotator, state).await?;
            state.record(&outcome);
        }
        Ok(())
    }

    /// Page through a single date, appending to the open year file.
    pub async fn extract_date(
        &self,
        date: NaiveDate,
        rotator: &mut YearFileRotator,
        state: &mut RunState,
    ) -> Result<DateOutcome> {
        log::info!("Fetching records for {}", date.cyan());

        let mut outcome = DateOutcome::new(date);
        let mut req = PageRequest::first(date, self.options.page_size);

        loop {
            let page = self.fetch_with_retry(&req).await?;

            if let Some(total) = page.total {
                state.last_total = Some(total);
                outcome.total = Some(total);
            }

            if page.is_empty() {
                log::info!("No more records for {} at offset {}", date, req.offset);
                break;
            }

            rotator
                .append(&page.records)
                .wrap_err_with(|| format!("Failed to write records for {}", req))?;

            let count = page.len() as u64;
            state.processed += count;
            outcome.records += count;
            outcome.pages += 1;

            log::info!(
                "Processed {}/{} records for {} (offset: {})",
                state.processed,
                total_label(state.last_total),
                date,
                req.offset
            );

            let next = req.next().filter(|next| self.within_window(next));
            let Some(next) = next else {
                log::warn!(
                    "Reached max_result_window for {}. Some records may be missing due to API limit.",
                    date.yellow()
                );
                outcome.truncated = true;
                break;
            };

            req = next;
            tokio::time::sleep(self.options.request_delay).await;
        }

        if let Some(missing) = outcome.shortfall().filter(|_| !outcome.truncated) {
            log::warn!(
                "API reported {} record(s) for {} but returned {} ({} missing)",
                outcome.total.unwrap_or_default(),
                date,
                outcome.records,
                missing
            );
        }

        Ok(outcome)
    }

    /// Whether the API will serve `req` without exceeding its result window.
    fn within_window(&self, req: &PageRequest) -> bool {
        req.offset
            .checked_add(req.limit)
            .is_some_and(|end| end <= self.options.max_result_window)
    }

    /// Fetch `req`, retrying the same offset as the policy allows.
    async fn fetch_with_retry(&self, req: &PageRequest) -> Result<Page> {
        let mut failed: u32 = 0;
        loop {
            match self.source.fetch_page(req).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    failed = failed.saturating_add(1);
                    log::error!("{} fetching {}: {}", e.kind(), req, e);
                    if let Some(body) = e.body() {
                        log::error!("Response content: {}", body);
                    }

                    if !self.options.retry.allows(failed) {
                        return Err(eyre::Report::new(e).wrap_err(format!(
                            "Giving up on {} after {} attempt(s)",
                            req, failed
                        )));
                    }

                    let delay = self.options.retry.delay_for(failed);
                    log::debug!("Retrying {} in {:?} (attempt {})", req, delay, failed + 1);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
