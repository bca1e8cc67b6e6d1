//! Reference dictionaries: hypermedia-paged lookups that back both the
//! dictionary list pages and the remote-search dropdown options.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::options::{OptionFetcher, SelectOption};
use crate::query::{FilterRejected, FilterSchema, ListFetcher, QueryState};
use crate::transport::paging::{PageAdapter, PagedResult};
use crate::transport::AuthTransport;

/// One dictionary entry (`districts`, `industries`, `statuses`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DictItem {
    pub id: i64,
    pub name: String,
}

impl DictItem {
    /// Default option mapping used by remote-search dropdowns.
    #[must_use]
    pub fn to_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.to_string(),
            label: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DictFilters {
    pub q: String,
}

impl FilterSchema for DictFilters {
    fn defaults() -> Self {
        Self::default()
    }

    fn normalize(candidate: Self) -> Result<Self, FilterRejected> {
        Ok(Self {
            q: candidate.q.trim().to_string(),
        })
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        if self.q.is_empty() {
            Vec::new()
        } else {
            vec![("q".to_string(), self.q.clone())]
        }
    }
}

/// Backend reader for one dictionary's list page (embedded paged shape).
pub struct DictionaryListFetcher {
    transport: Arc<AuthTransport>,
    endpoint: String,
}

impl DictionaryListFetcher {
    pub fn new(transport: Arc<AuthTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ListFetcher<DictFilters, DictItem> for DictionaryListFetcher {
    async fn fetch_page(&self, query: &QueryState<DictFilters>) -> ApiResult<PagedResult<DictItem>> {
        let body = self
            .transport
            .get_json(&self.endpoint, query.wire_params())
            .await?;
        PageAdapter::EmbeddedPage.parse(&body)
    }
}

/// Dropdown option source over a dictionary endpoint.
///
/// The backend ignores pagination for these lookups, so `page=0&size=0`
/// requests the whole (bounded) set; a non-empty search narrows it.
pub struct DictionaryOptions {
    transport: Arc<AuthTransport>,
    endpoint: String,
}

impl DictionaryOptions {
    pub fn new(transport: Arc<AuthTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl OptionFetcher for DictionaryOptions {
    async fn fetch_options(&self, search: &str) -> ApiResult<Vec<SelectOption>> {
        let mut query = vec![
            ("page".to_string(), "0".to_string()),
            ("size".to_string(), "0".to_string()),
        ];
        if !search.is_empty() {
            query.push(("q".to_string(), search.to_string()));
        }

        let body = self.transport.get_json(&self.endpoint, query).await?;
        let page: PagedResult<DictItem> = PageAdapter::EmbeddedPage.parse(&body)?;
        Ok(page.content.iter().map(DictItem::to_option).collect())
    }
}
