//! Remote search API client.
//!
//! Builds histogram queries against the analytics API and pulls the hit list
//! out of whatever comes back.

mod client;
mod error;
mod query;

pub use client::{endpoint_url, extract_hits, SearchClient};
pub use error::SearchError;
pub use query::{SearchQuery, SearchTarget, HISTOGRAM_PATH};
