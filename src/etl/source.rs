//! Page source trait for the remote records API

use crate::client::{FetchError, Page, PageRequest};

/// Source of record pages for an exact-date query.
///
/// [`RegistryClient`](crate::client::RegistryClient) is the production
/// implementation. Anything that can answer `(date, offset, limit)` with a
/// [`Page`] can drive the extractor.
///
/// # Example
/// ```no_run
/// use mca_company_extractor::client::{FetchError, Page, PageRequest};
/// use mca_company_extractor::etl::PageSource;
///
/// struct EmptySource;
///
/// impl PageSource for EmptySource {
///     async fn fetch_page(&self, _req: &PageRequest) -> Result<Page, FetchError> {
///         Ok(Page::default())
///     }
/// }
/// ```
pub trait PageSource: Send + Sync {
    /// Fetch one page
    ///
    /// # Errors
    /// Returns a [`FetchError`] classifying transport, HTTP status, and
    /// decode failures. The caller decides whether to retry.
    fn fetch_page(
        &self,
        req: &PageRequest,
    ) -> impl std::future::Future<Output = Result<Page, FetchError>> + Send;
}
