//! # Authenticated Transport
//!
//! Wraps every outbound call to the backend: attaches the current access
//! credential, coordinates the single-flight credential refresh on
//! authorization failures, replays blocked requests exactly once, and
//! normalizes every failure into the uniform problem shape before it
//! reaches callers.
//!
//! The HTTP engine sits behind the [`HttpExec`] trait so the refresh
//! machine and replay rules can be exercised against a scripted executor
//! in tests, with [`ReqwestExec`] as the production implementation.

pub mod paging;
pub mod refresh;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, Problem};
use crate::session::SessionStore;

use self::refresh::{RefreshCoordinator, RefreshOutcome};

const REFRESH_PATH: &str = "/auth/refresh";

/// HTTP method subset the console uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One outbound request, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    /// Query parameters; repeated keys express array-valued filters
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Marks auth endpoints that carry the `X-Client: WEB` tag
    pub client_tag: bool,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            client_tag: false,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body,
            client_tag: false,
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            client_tag: false,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            query: Vec::new(),
            body: None,
            client_tag: false,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_client_tag(mut self) -> Self {
        self.client_tag = true;
        self
    }
}

/// Raw outcome of one HTTP exchange, before normalization.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer (no response was produced).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport failure: {0}")]
    Other(String),
}

/// Seam between the refresh machine and the HTTP engine.
///
/// Implementations perform exactly one exchange: no retries, no refresh,
/// no normalization. Those concerns belong to [`AuthTransport`].
#[async_trait]
pub trait HttpExec: Send + Sync {
    async fn execute(
        &self,
        spec: &RequestSpec,
        access_token: Option<&str>,
        language: &str,
    ) -> Result<RawResponse, ExecError>;
}

/// Production executor backed by reqwest with a shared cookie store
/// (the refresh credential travels as a cookie).
pub struct ReqwestExec {
    client: Client,
    base_url: Url,
}

impl ReqwestExec {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("Invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .user_agent(format!("crm-console/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl HttpExec for ReqwestExec {
    async fn execute(
        &self,
        spec: &RequestSpec,
        access_token: Option<&str>,
        language: &str,
    ) -> Result<RawResponse, ExecError> {
        let mut url = self
            .base_url
            .join(&spec.path)
            .map_err(|e| ExecError::Other(format!("Failed to construct URL: {e}")))?;

        if !spec.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &spec.query {
                pairs.append_pair(key, value);
            }
            drop(pairs);
        }

        let mut request = match spec.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };

        request = request.header(ACCEPT_LANGUAGE, language);
        if spec.client_tag {
            request = request
                .header("X-Client", "WEB")
                .header(CONTENT_TYPE, "application/json");
        }
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExecError::Timeout
            } else if e.is_connect() {
                ExecError::Connect(e.to_string())
            } else {
                ExecError::Other(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();

        Ok(RawResponse { status, body })
    }
}

/// Authenticated transport with single-flight credential refresh.
pub struct AuthTransport {
    exec: Arc<dyn HttpExec>,
    session: Arc<SessionStore>,
    refresh: RefreshCoordinator,
    language: String,
}

impl AuthTransport {
    /// Create a transport backed by a reqwest executor.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        let exec = Arc::new(ReqwestExec::new(config)?);
        Ok(Self::with_exec(exec, session, config))
    }

    /// Create a transport over an explicit executor (used by tests).
    pub fn with_exec(
        exec: Arc<dyn HttpExec>,
        session: Arc<SessionStore>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            exec,
            session,
            refresh: RefreshCoordinator::new(Duration::from_millis(config.refresh_timeout_ms)),
            language: config.language.clone(),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Issue a request through the full machine: credential attachment,
    /// single-flight refresh on authorization failure, one replay, and
    /// problem normalization.
    pub async fn request(&self, spec: RequestSpec) -> ApiResult<RawResponse> {
        let first = self.attempt(&spec).await?;
        if first.status != 401 {
            return conclude(first);
        }

        debug!(path = %spec.path, "Unauthorized response, coordinating credential refresh");
        match self.refresh.run(|| self.refresh_credential()).await {
            RefreshOutcome::Refreshed => {
                let replay = self.attempt(&spec).await?;
                if replay.status == 401 {
                    // A second authorization failure after replay is
                    // terminal; looping back into refresh is forbidden.
                    warn!(path = %spec.path, "Replay rejected again, treating as terminal");
                    return Err(ApiError::Unauthorized(Problem::from_body(
                        401,
                        replay.body.as_ref(),
                    )));
                }
                conclude(replay)
            }
            RefreshOutcome::Failed => {
                self.session.clear();
                Err(ApiError::Unauthorized(Problem::unauthorized()))
            }
        }
    }

    /// GET returning the parsed JSON body.
    pub async fn get_json(
        &self,
        path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> ApiResult<Value> {
        let response = self
            .request(RequestSpec::get(path).with_query(query))
            .await?;
        Ok(response.body.unwrap_or(Value::Null))
    }

    /// POST/PUT/DELETE returning the parsed JSON body; field-level
    /// validation failures arrive as `ApiError::Api` with `field_errors`.
    pub async fn send_json(&self, spec: RequestSpec) -> ApiResult<Value> {
        let response = self.request(spec).await?;
        Ok(response.body.unwrap_or(Value::Null))
    }

    /// One exchange with the current credential attached.
    async fn attempt(&self, spec: &RequestSpec) -> ApiResult<RawResponse> {
        let token = self.session.access_token();
        self.exec
            .execute(spec, token.as_deref(), &self.language)
            .await
            .map_err(|e| ApiError::Network(Problem::network(e.to_string())))
    }

    /// The leader's refresh call. The refresh credential travels as a
    /// cookie; a fresh access credential comes back in the body.
    async fn refresh_credential(&self) -> bool {
        let spec = RequestSpec::post(REFRESH_PATH, None).with_client_tag();
        match self.exec.execute(&spec, None, &self.language).await {
            Ok(response) if response.is_success() => {
                if let Some(token) = response
                    .body
                    .as_ref()
                    .and_then(|b| b.get("accessToken"))
                    .and_then(Value::as_str)
                {
                    self.session.set_access_token(token.to_string());
                }
                debug!("Credential refresh succeeded");
                true
            }
            Ok(response) => {
                warn!(status = response.status, "Credential refresh rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                false
            }
        }
    }
}

/// Map a non-401 response to the caller-facing result.
fn conclude(response: RawResponse) -> ApiResult<RawResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let problem = Problem::from_body(response.status, response.body.as_ref());
    if response.status == 401 {
        return Err(ApiError::Unauthorized(problem));
    }
    Err(ApiError::Api(problem))
}
