//! Remote data API client.
//!
//! This module provides the [`RegistryClient`] for paging through the
//! company-registration resource, along with the request/response types
//! ([`PageRequest`], [`Page`]) and the classified [`FetchError`].

mod auth;
mod error;
mod page;
mod registry;

pub use auth::ApiKey;
pub use error::FetchError;
pub use page::{Page, PageRequest};
pub use registry::{DEFAULT_API_URL, RegistryClient};
