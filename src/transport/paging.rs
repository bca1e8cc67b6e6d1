//! # Page Response Adapters
//!
//! The backend serves two paged shapes: the flat
//! `{content, totalElements, totalPages}` form used by list endpoints, and
//! the hypermedia form used by dictionary-style lookups, where rows hide in
//! the first `_embedded` collection and totals in a `page` object. Each
//! endpoint declares which adapter it speaks; nothing sniffs shapes inline.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// One page of rows, replaced wholesale on each successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
        }
    }
}

/// Which paged wire shape an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAdapter {
    /// `{ content: [...], totalElements, totalPages }`
    FlatPage,
    /// `{ _embedded: { <collection>: [...] }, page: { totalElements, totalPages } }`
    EmbeddedPage,
}

impl PageAdapter {
    /// Extract a page of `T` rows from a response body.
    pub fn parse<T: DeserializeOwned>(self, body: &Value) -> ApiResult<PagedResult<T>> {
        match self {
            PageAdapter::FlatPage => serde_json::from_value(body.clone())
                .map_err(|e| ApiError::InvalidResponse(format!("flat page: {e}"))),
            PageAdapter::EmbeddedPage => Self::parse_embedded(body),
        }
    }

    fn parse_embedded<T: DeserializeOwned>(body: &Value) -> ApiResult<PagedResult<T>> {
        // Dictionary lookups may return no _embedded at all when empty.
        let Some(embedded) = body.get("_embedded").and_then(Value::as_object) else {
            return Ok(PagedResult::default());
        };

        let content = match embedded.values().next() {
            Some(first) => serde_json::from_value(first.clone())
                .map_err(|e| ApiError::InvalidResponse(format!("embedded collection: {e}")))?,
            None => Vec::new(),
        };

        let page = body.get("page");
        let total_elements = page
            .and_then(|p| p.get("totalElements"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let total_pages = page
            .and_then(|p| p.get("totalPages"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(PagedResult {
            content,
            total_elements,
            total_pages,
        })
    }
}
