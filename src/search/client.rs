use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SearchSettings;
use crate::shape::{JsonKind, Shape};

use super::error::SearchError;
use super::query::{SearchQuery, SearchTarget, HISTOGRAM_PATH};

/// Client for the remote analytics search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    token_header: HeaderName,
    fetch_limit: u32,
}

impl SearchClient {
    pub fn new(settings: &SearchSettings) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(SearchError::Client)?;

        let token_header = HeaderName::from_bytes(settings.token_header.as_bytes())
            .map_err(|e| SearchError::InvalidHeader(format!("{}: {e}", settings.token_header)))?;

        Ok(Self {
            client,
            token_header,
            fetch_limit: settings.fetch_limit,
        })
    }

    pub fn fetch_limit(&self) -> u32 {
        self.fetch_limit
    }

    /// Run one search and return the raw hit objects in response order.
    ///
    /// Request failures are errors. A response whose nesting differs from the
    /// documented layout yields an empty list instead.
    pub async fn fetch(
        &self,
        target: &SearchTarget,
        query: &SearchQuery,
    ) -> Result<Vec<Value>, SearchError> {
        if target.site.trim().is_empty() {
            return Err(SearchError::MissingSite);
        }
        if target.token.trim().is_empty() {
            return Err(SearchError::MissingToken);
        }

        let url = endpoint_url(&target.site, target.grid_account.as_deref())?;
        let token = HeaderValue::from_str(&target.token)
            .map_err(|e| SearchError::InvalidHeader(format!("token: {e}")))?;
        let payload = query.to_payload(self.fetch_limit);

        debug!(
            url = %url,
            search = %query.search,
            range_from = query.start_time,
            range_to = query.end_time,
            fetch_limit = self.fetch_limit,
            "sending search request"
        );

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(self.token_header.clone(), token)
            .json(&payload)
            .send()
            .await
            .map_err(SearchError::Transport)?;

        let status = response.status();
        debug!(status = %status, "search API responded");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(SearchError::Transport)?;
        if body.is_empty() {
            return Err(SearchError::EmptyBody);
        }
        debug!(bytes = body.len(), "read search response body");

        let document: Value =
            serde_json::from_slice(&body).map_err(|e| SearchError::MalformedJson {
                reason: e.to_string(),
            })?;
        if !document.is_object() {
            return Err(SearchError::MalformedJson {
                reason: format!("top-level value is {}", JsonKind::of(&document)),
            });
        }

        Ok(extract_hits(document))
    }
}

/// Build `{site}/api/ds/get_index_zoom_histogram_lv3[?gridaccount=...]`.
pub fn endpoint_url(site: &str, grid_account: Option<&str>) -> Result<Url, SearchError> {
    let raw = format!("{}/{}", site.trim_end_matches('/'), HISTOGRAM_PATH);
    let mut url = Url::parse(&raw).map_err(|e| SearchError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if let Some(account) = grid_account.filter(|a| !a.is_empty()) {
        url.query_pairs_mut().append_pair("gridaccount", account);
    }
    Ok(url)
}

/// Take the hit array out of a search response.
///
/// Every level of `response.hits.hits` is checked before descending; any
/// mismatch is logged and produces an empty list.
pub fn extract_hits(mut document: Value) -> Vec<Value> {
    let checked = Shape::new(&document)
        .descend("response")
        .and_then(|response| response.descend("hits"))
        .and_then(|hits| hits.array("hits").map(|_| ()));

    if let Err(err) = checked {
        warn!(error = %err, "search response has no usable hit list");
        return Vec::new();
    }

    match document.pointer_mut("/response/hits/hits").map(Value::take) {
        Some(Value::Array(hits)) => hits,
        _ => Vec::new(),
    }
}
