//! Run configuration
//!
//! Credentials and the endpoint are read from the environment (optionally
//! sourced from a dotenv file by the binary). Everything else has a default
//! that matches the public API's documented limits.

use crate::client::{ApiKey, DEFAULT_API_URL, RegistryClient};
use crate::etl::{DateRange, ExtractOptions, RetryPolicy};

use eyre::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable holding the API key (required).
pub const API_KEY_VAR: &str = "DATA_GOV_API_KEY";
/// Environment variable overriding the resource URL (optional).
pub const API_URL_VAR: &str = "DATA_GOV_API_URL";

pub const DEFAULT_PAGE_SIZE: u64 = 1000;
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_START_YEAR: i32 = 2014;
pub const DEFAULT_END_YEAR: i32 = 2024;

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub api_url: Url,
    pub api_key: ApiKey,
    pub page_size: u64,
    pub max_result_window: u64,
    pub request_delay: Duration,
    pub retry_delay: Duration,
    /// Attempts per page before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
    pub range: DateRange,
    pub output_dir: PathBuf,
    /// Per-request transport timeout; `None` keeps the client default.
    pub timeout: Option<Duration>,
}

impl ExtractConfig {
    /// Default settings for the given endpoint and key.
    pub fn new(api_url: Url, api_key: ApiKey) -> Result<Self> {
        Ok(Self {
            api_url,
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
            request_delay: DEFAULT_REQUEST_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: None,
            range: DateRange::years(DEFAULT_START_YEAR, DEFAULT_END_YEAR)?,
            output_dir: PathBuf::from("."),
            timeout: None,
        })
    }

    /// Load the endpoint and key from environment variables
    ///
    /// Expected environment variables:
    /// - DATA_GOV_API_KEY: API key (required)
    /// - DATA_GOV_API_URL: Resource URL (optional, defaults to the company master resource)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .with_context(|| format!("{} environment variable not set", API_KEY_VAR))?;

        let url_str = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&url_str)
            .with_context(|| format!("Invalid {}: {}", API_URL_VAR, url_str))?;

        Self::new(api_url, ApiKey::new(api_key))
    }

    /// Check the settings before any request is issued.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            bail!("{} is empty", API_KEY_VAR);
        }
        if self.page_size == 0 {
            bail!("Page size must be greater than zero");
        }
        if self.max_result_window < self.page_size {
            bail!(
                "Max result window ({}) is smaller than the page size ({})",
                self.max_result_window,
                self.page_size
            );
        }
        if self.range.is_empty() {
            bail!("Start date {} is after end date {}", self.range.start(), self.range.end());
        }
        if self.max_attempts == Some(0) {
            bail!("Max attempts must be at least 1");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::unbounded(self.retry_delay).with_max_attempts(self.max_attempts)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            page_size: self.page_size,
            max_result_window: self.max_result_window,
            request_delay: self.request_delay,
            retry: self.retry_policy(),
        }
    }

    /// Build the API client these settings describe.
    pub fn client(&self) -> Result<RegistryClient> {
        RegistryClient::try_new(self.api_url.clone(), self.api_key.clone(), self.timeout)
            .context("Failed to create registry client")
    }
}
