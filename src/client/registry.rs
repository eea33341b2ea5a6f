//! Registry client module
//!
//! Provides `RegistryClient` for paging through the company-registration
//! resource on the open-data API, one exact-date filter at a time.

use super::{ApiKey, FetchError, Page, PageRequest};
use crate::etl::PageSource;

use eyre::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Company master data resource on api.data.gov.in.
pub const DEFAULT_API_URL: &str =
    "https://api.data.gov.in/resource/ec58dab7-d891-4abb-936e-d5d274a6ce9b";

/// Client for the paginated registration-records endpoint.
///
/// A single `reqwest::Client` is held for the lifetime of the run so the
/// underlying connection pool is reused across every page request. No
/// per-request state is carried between calls.
///
/// # Example
/// ```no_run
/// use mca_company_extractor::client::{ApiKey, PageRequest, RegistryClient};
/// use mca_company_extractor::etl::PageSource;
/// use chrono::NaiveDate;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://api.data.gov.in/resource/ec58dab7-d891-4abb-936e-d5d274a6ce9b")?;
/// let client = RegistryClient::try_new(url, ApiKey::new("my-key"), None)?;
///
/// let date = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
/// let page = client.fetch_page(&PageRequest::first(date, 1000)).await?;
/// println!("{} records, total {:?}", page.len(), page.total);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RegistryClient {
    client: Client,
    url: Url,
    api_key: ApiKey,
}

impl RegistryClient {
    /// Create a client for the resource at `url`.
    ///
    /// `timeout` bounds each request end to end; `None` leaves the
    /// transport's own defaults in place.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn try_new(url: Url, api_key: ApiKey, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    /// Full request URL for a page, including the API key.
    pub fn page_url(&self, req: &PageRequest) -> Url {
        self.build_url(req, self.api_key.expose())
    }

    /// Same as [`page_url`](Self::page_url) with the API key masked, for logging.
    pub fn redacted_url(&self, req: &PageRequest) -> Url {
        self.build_url(req, &self.api_key.to_string())
    }

    fn build_url(&self, req: &PageRequest, key: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("api-key", key)
            .append_pair("format", "json")
            .append_pair("offset", &req.offset.to_string())
            .append_pair("limit", &req.limit.to_string())
            .append_pair("filters[date_of_registration]", &req.date_filter());
        url
    }

    async fn get_page(&self, req: &PageRequest) -> Result<Page, FetchError> {
        log::info!("Fetching URL: {}", self.redacted_url(req));

        let response = self.client.get(self.page_url(req)).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        Page::from_body(&body)
    }
}

impl PageSource for RegistryClient {
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page, FetchError> {
        self.get_page(req).await
    }
}

impl std::fmt::Display for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
