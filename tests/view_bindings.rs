//! Wire-level tests for the view bindings: filter-to-parameter mapping
//! through the authenticated transport, and both paged response shapes.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use console_core::transport::{ExecError, HttpExec, RawResponse, RequestSpec};
use console_core::views::companies::{CompanyFilters, CompanyListFetcher};
use console_core::views::dictionaries::{DictFilters, DictionaryListFetcher, DictionaryOptions};
use console_core::views::users::{UserFilters, UserListFetcher};
use console_core::{
    AuthTransport, ClientConfig, FilterSchema, ListFetcher, OptionFetcher, QueryState,
    SessionStore, SortDir,
};

/// Captures every request and answers from a canned body per path.
struct CapturingBackend {
    requests: Mutex<Vec<RequestSpec>>,
}

#[async_trait]
impl HttpExec for CapturingBackend {
    async fn execute(
        &self,
        spec: &RequestSpec,
        _access_token: Option<&str>,
        _language: &str,
    ) -> Result<RawResponse, ExecError> {
        self.requests.lock().push(spec.clone());
        let body = match spec.path.as_str() {
            "/companies" => json!({
                "content": [{
                    "id": 12,
                    "fullName": "ACME Spółka z o.o.",
                    "shortName": "ACME",
                    "nip": "1234567890",
                    "district": { "id": 5, "name": "Mazowieckie" }
                }],
                "totalElements": 1,
                "totalPages": 1
            }),
            "/users" => json!({
                "content": [{
                    "id": 7,
                    "username": "jkowalski",
                    "firstname": "Jan",
                    "lastname": "Kowalski"
                }],
                "totalElements": 1,
                "totalPages": 1
            }),
            "/dict/districts" => json!({
                "_embedded": {
                    "districts": [
                        { "id": 5, "name": "Mazowieckie" },
                        { "id": 6, "name": "Pomorskie" }
                    ]
                },
                "page": { "totalElements": 2, "totalPages": 1 }
            }),
            other => panic!("unexpected path {other}"),
        };
        Ok(RawResponse {
            status: 200,
            body: Some(body),
        })
    }
}

fn transport() -> (Arc<AuthTransport>, Arc<CapturingBackend>) {
    let backend = Arc::new(CapturingBackend {
        requests: Mutex::new(Vec::new()),
    });
    let session = Arc::new(SessionStore::new());
    session.set_session(None, Some("token-1".to_string()));
    let transport = Arc::new(AuthTransport::with_exec(
        Arc::clone(&backend) as Arc<dyn HttpExec>,
        session,
        &ClientConfig::default(),
    ));
    (transport, backend)
}

#[tokio::test]
async fn company_query_maps_to_wire_parameters() {
    let (transport, backend) = transport();
    let fetcher = CompanyListFetcher::new(transport);

    let filters = CompanyFilters::normalize(CompanyFilters {
        search: "acme".into(),
        districts: vec!["5".into(), "7".into()],
        ..Default::default()
    })
    .unwrap();
    let query = QueryState {
        page: 2,
        size: 20,
        sort_by: Some("fullName".to_string()),
        sort_dir: SortDir::Desc,
        filters,
    };

    let page = fetcher.fetch_page(&query).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].short_name, "ACME");

    let requests = backend.requests.lock();
    let sent = &requests[0].query;
    assert!(sent.contains(&("page".to_string(), "2".to_string())));
    assert!(sent.contains(&("size".to_string(), "20".to_string())));
    assert!(sent.contains(&("sort".to_string(), "fullName,desc".to_string())));
    assert!(sent.contains(&("q".to_string(), "acme".to_string())));
    // Array-valued filters repeat the key.
    assert!(sent.contains(&("district".to_string(), "5".to_string())));
    assert!(sent.contains(&("district".to_string(), "7".to_string())));
}

#[tokio::test]
async fn dictionary_options_use_the_embedded_shape() {
    let (transport, backend) = transport();
    let options = DictionaryOptions::new(transport, "/dict/districts");

    let fetched = options.fetch_options("").await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].value, "5");
    assert_eq!(fetched[0].label, "Mazowieckie");

    let requests = backend.requests.lock();
    let sent = &requests[0].query;
    // Empty search fetches the default page, with no q parameter.
    assert!(sent.contains(&("page".to_string(), "0".to_string())));
    assert!(sent.contains(&("size".to_string(), "0".to_string())));
    assert!(!sent.iter().any(|(key, _)| key == "q"));
}

#[tokio::test]
async fn user_list_speaks_the_flat_shape() {
    let (transport, _backend) = transport();
    let fetcher = UserListFetcher::new(transport);

    let query = QueryState {
        page: 0,
        size: 10,
        sort_by: None,
        sort_dir: SortDir::Asc,
        filters: UserFilters::normalize(UserFilters { q: "kowal".into() }).unwrap(),
    };

    let page = fetcher.fetch_page(&query).await.unwrap();
    assert_eq!(page.content[0].username, "jkowalski");
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn dictionary_list_speaks_the_embedded_shape() {
    let (transport, _backend) = transport();
    let fetcher = DictionaryListFetcher::new(transport, "/dict/districts");

    let query = QueryState {
        page: 0,
        size: 10,
        sort_by: None,
        sort_dir: SortDir::Asc,
        filters: DictFilters::default(),
    };

    let page = fetcher.fetch_page(&query).await.unwrap();
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_elements, 2);
}

#[tokio::test]
async fn dictionary_search_narrows_the_lookup() {
    let (transport, backend) = transport();
    let options = DictionaryOptions::new(transport, "/dict/districts");

    options.fetch_options("mazo").await.unwrap();

    let requests = backend.requests.lock();
    assert!(requests[0]
        .query
        .contains(&("q".to_string(), "mazo".to_string())));
}
