//! Remote search handlers.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::sanitize::{SanitizationRules, Sanitizer};
use crate::search::{SearchQuery, SearchTarget};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

/// Search window, credentials and optional rules shared by the fetch and
/// capture requests.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_string: String,
    pub start_time: i64,
    pub end_time: i64,
    pub grid_account: Option<String>,
    pub site: String,
    pub token: String,
    /// Replaces the configured default rules for this request only.
    pub rules: Option<SanitizationRules>,
}

impl SearchRequest {
    pub(crate) fn target(&self) -> SearchTarget {
        let target = SearchTarget::new(self.site.clone(), self.token.clone());
        match self.grid_account.as_deref().map(str::trim) {
            Some(account) if !account.is_empty() => target.with_grid_account(account),
            _ => target,
        }
    }

    pub(crate) fn query(&self) -> SearchQuery {
        SearchQuery::new(self.search_string.clone(), self.start_time, self.end_time)
    }

    /// Run the search and sanitize every hit.
    pub(crate) async fn fetch_sanitized(
        &self,
        state: &WebAppState,
    ) -> Result<Vec<Value>, WebError> {
        let mut hits = state.search().fetch(&self.target(), &self.query()).await?;
        let rules = self.rules.as_ref().unwrap_or(&state.config().sanitize);
        Sanitizer::new(rules).apply_all(&mut hits);
        Ok(hits)
    }
}

/// Fetch and sanitize hits without storing them.
pub async fn fetch_hits(
    State(state): State<WebAppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<Value>>, WebError> {
    let hits = req.fetch_sanitized(&state).await?;
    tracing::debug!(hits = hits.len(), "search fetched");
    Ok(Json(hits))
}
