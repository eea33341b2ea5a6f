//! Page request and response types

use super::FetchError;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// One page of the exact-date query: `(date, offset, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub date: NaiveDate,
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn first(date: NaiveDate, limit: u64) -> Self {
        Self {
            date,
            offset: 0,
            limit,
        }
    }

    /// The request for the page that follows this one, or `None` if its
    /// offset would not fit in a `u64`.
    pub fn next(&self) -> Option<Self> {
        let offset = self.offset.checked_add(self.limit)?;
        Some(Self { offset, ..*self })
    }

    /// Date filter value as sent to the API (`YYYY-MM-DD`).
    pub fn date_filter(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.date_filter(), self.offset)
    }
}

/// Decoded response for one page.
///
/// Records are kept as opaque JSON documents and never inspected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    /// Advisory record count for the filter, if the API reported one.
    pub total: Option<u64>,
}

#[derive(Deserialize)]
struct PageBody {
    records: Vec<Value>,
    #[serde(default)]
    total: Option<Total>,
}

/// The API has been seen to report `total` both as a number and a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
    Number(u64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl Total {
    fn into_count(self) -> Option<u64> {
        match self {
            Total::Number(n) => Some(n),
            Total::Text(s) => s.trim().parse().ok(),
            Total::Other(_) => None,
        }
    }
}

impl Page {
    pub fn new(records: Vec<Value>, total: Option<u64>) -> Self {
        Self { records, total }
    }

    /// Decode a response body.
    ///
    /// Anything other than an object carrying a `records` array is a
    /// [`FetchError::Decode`].
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let parsed: PageBody = serde_json::from_str(body).map_err(|e| FetchError::Decode {
            reason: e.to_string(),
            body: body.to_string(),
        })?;

        Ok(Self {
            records: parsed.records,
            total: parsed.total.and_then(Total::into_count),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
