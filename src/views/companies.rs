//! Company list view: the console's richest filter surface (free text,
//! multi-selects, an employee-count range, and a created-date range).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::query::{FilterRejected, FilterSchema, ListFetcher, QueryState};
use crate::transport::paging::{PageAdapter, PagedResult};
use crate::transport::AuthTransport;

use super::NamedRef;

const COMPANIES_PATH: &str = "/companies";

/// Filters for the company list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompanyFilters {
    pub search: String,
    /// District ids; serialized as repeated `district` keys
    pub districts: Vec<String>,
    /// Status ids; serialized as repeated `status` keys
    pub statuses: Vec<String>,
    pub employees_min: Option<u32>,
    pub employees_max: Option<u32>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl FilterSchema for CompanyFilters {
    fn defaults() -> Self {
        Self::default()
    }

    fn normalize(candidate: Self) -> Result<Self, FilterRejected> {
        if let (Some(min), Some(max)) = (candidate.employees_min, candidate.employees_max) {
            if min > max {
                return Err(FilterRejected(format!(
                    "employee range inverted: {min} > {max}"
                )));
            }
        }

        // An inverted date range is a picker artifact, not user intent.
        let (created_from, created_to) = match (candidate.created_from, candidate.created_to) {
            (Some(from), Some(to)) if from > to => (Some(to), Some(from)),
            other => other,
        };

        Ok(Self {
            search: candidate.search.trim().to_string(),
            districts: keep_nonempty(candidate.districts),
            statuses: keep_nonempty(candidate.statuses),
            employees_min: candidate.employees_min,
            employees_max: candidate.employees_max,
            created_from,
            created_to,
        })
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("q".to_string(), self.search.clone()));
        }
        for district in &self.districts {
            pairs.push(("district".to_string(), district.clone()));
        }
        for status in &self.statuses {
            pairs.push(("status".to_string(), status.clone()));
        }
        if let Some(min) = self.employees_min {
            pairs.push(("employeesMin".to_string(), min.to_string()));
        }
        if let Some(max) = self.employees_max {
            pairs.push(("employeesMax".to_string(), max.to_string()));
        }
        if let Some(from) = self.created_from {
            pairs.push(("createdFrom".to_string(), from.to_rfc3339()));
        }
        if let Some(to) = self.created_to {
            pairs.push(("createdTo".to_string(), to.to_rfc3339()));
        }
        pairs
    }
}

fn keep_nonempty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// One company row as the list endpoint serves it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub id: i64,
    pub full_name: String,
    pub short_name: String,
    #[serde(default)]
    pub nip: Option<String>,
    #[serde(default)]
    pub district: Option<NamedRef>,
    #[serde(default)]
    pub status: Option<NamedRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Backend reader for the company list (flat paged shape).
pub struct CompanyListFetcher {
    transport: Arc<AuthTransport>,
}

impl CompanyListFetcher {
    pub fn new(transport: Arc<AuthTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ListFetcher<CompanyFilters, CompanyRow> for CompanyListFetcher {
    async fn fetch_page(
        &self,
        query: &QueryState<CompanyFilters>,
    ) -> ApiResult<PagedResult<CompanyRow>> {
        let body = self
            .transport
            .get_json(COMPANIES_PATH, query.wire_params())
            .await?;
        PageAdapter::FlatPage.parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn normalize_trims_and_drops_empty_selections() {
        let normalized = CompanyFilters::normalize(CompanyFilters {
            search: "  acme  ".into(),
            districts: vec!["5".into(), "  ".into(), "7".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(normalized.search, "acme");
        assert_eq!(normalized.districts, vec!["5".to_string(), "7".to_string()]);
    }

    #[test]
    fn inverted_date_range_is_swapped() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let normalized = CompanyFilters::normalize(CompanyFilters {
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(normalized.created_from, Some(to));
        assert_eq!(normalized.created_to, Some(from));
    }

    #[test]
    fn inverted_employee_range_is_rejected() {
        let err = CompanyFilters::normalize(CompanyFilters {
            employees_min: Some(50),
            employees_max: Some(10),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn array_filters_repeat_the_key() {
        let filters = CompanyFilters {
            search: "acme".into(),
            districts: vec!["5".into(), "7".into()],
            ..Default::default()
        };
        let pairs = filters.query_pairs();
        assert_eq!(pairs[0], ("q".to_string(), "acme".to_string()));
        assert_eq!(pairs[1], ("district".to_string(), "5".to_string()));
        assert_eq!(pairs[2], ("district".to_string(), "7".to_string()));
    }

    #[test]
    fn row_deserializes_from_camel_case() {
        let row: CompanyRow = serde_json::from_value(serde_json::json!({
            "id": 12,
            "fullName": "ACME Spółka z o.o.",
            "shortName": "ACME",
            "district": { "id": 5, "name": "Mazowieckie" }
        }))
        .unwrap();
        assert_eq!(row.short_name, "ACME");
        assert_eq!(row.district.unwrap().name, "Mazowieckie");
        assert_eq!(row.nip, None);
    }
}
