use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::TIMESTAMP_FIELD;

/// Remote API path, relative to the site root.
pub const HISTOGRAM_PATH: &str = "api/ds/get_index_zoom_histogram_lv3";

/// Which remote site to query and how to authenticate against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTarget {
    pub site: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_account: Option<String>,
}

impl SearchTarget {
    pub fn new(site: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            token: token.into(),
            grid_account: None,
        }
    }

    pub fn with_grid_account(mut self, account: impl Into<String>) -> Self {
        self.grid_account = Some(account.into());
        self
    }
}

/// A free-text search over an epoch-millisecond window.
///
/// Bounds are forwarded as given; the remote side decides what an empty or
/// inverted window means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl SearchQuery {
    pub fn new(search: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        Self {
            search: search.into(),
            start_time,
            end_time,
        }
    }

    /// Request body for the histogram endpoint: a date facet on the timestamp,
    /// ascending sort and a fixed result window starting at zero.
    pub fn to_payload(&self, fetch_limit: u32) -> Value {
        json!({
            "kargs": {
                "partition": "default",
                "dataType": "event",
                "options": {
                    "dateFacetField": TIMESTAMP_FIELD,
                    "facets": {
                        "facets": [],
                        "mustFilters": [],
                        "mustNotFilters": [],
                        "dateFacets": [
                            {"name": "dateHistogram", "key": TIMESTAMP_FIELD}
                        ]
                    },
                    "dataType": "event",
                    "searchStr": self.search,
                    "sortField": TIMESTAMP_FIELD,
                    "sortOrder": "asc",
                    "range_from": self.start_time,
                    "range_to": self.end_time,
                    "fetchOffset": 0,
                    "fetchLimit": fetch_limit
                }
            }
        })
    }
}
