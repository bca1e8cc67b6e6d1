//! User list view: a single free-text filter over the flat paged shape.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::query::{FilterRejected, FilterSchema, ListFetcher, QueryState};
use crate::transport::paging::{PageAdapter, PagedResult};
use crate::transport::AuthTransport;

const USERS_PATH: &str = "/users";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilters {
    pub q: String,
}

impl FilterSchema for UserFilters {
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

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
}

pub struct UserListFetcher {
    transport: Arc<AuthTransport>,
}

impl UserListFetcher {
    pub fn new(transport: Arc<AuthTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ListFetcher<UserFilters, UserRow> for UserListFetcher {
    async fn fetch_page(&self, query: &QueryState<UserFilters>) -> ApiResult<PagedResult<UserRow>> {
        let body = self.transport.get_json(USERS_PATH, query.wire_params()).await?;
        PageAdapter::FlatPage.parse(&body)
    }
}
