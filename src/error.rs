//! # Error Types
//!
//! Unified error handling for the console core. Every failure that crosses
//! the transport boundary is normalized into a [`Problem`] first, so calling
//! code never branches on transport-specific error shapes.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Console core operation result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Normalized error payload shared by every failing response.
///
/// Backend error bodies follow a structured "problem" shape
/// (`status`, `title`, `detail`/`message`, `errors`); anything else is
/// flattened into this form with a generic title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Problem {
    /// HTTP status of the failing response; 0 for network-level failures
    pub status: u16,
    pub title: String,
    pub message: String,
    /// Field-level validation messages keyed by field name
    pub field_errors: BTreeMap<String, String>,
}

impl Problem {
    /// Build a problem from a raw response body.
    ///
    /// Recognizes the backend's structured problem shape and the legacy
    /// `{error, message}` shape; everything else becomes an opaque message.
    pub fn from_body(status: u16, body: Option<&Value>) -> Self {
        let Some(raw) = body else {
            return Self {
                status,
                title: "Error".to_string(),
                message: format!("HTTP {status}"),
                field_errors: BTreeMap::new(),
            };
        };

        let Some(obj) = raw.as_object() else {
            return Self {
                status,
                title: "Error".to_string(),
                message: raw.to_string(),
                field_errors: BTreeMap::new(),
            };
        };

        if obj.contains_key("status")
            || obj.contains_key("title")
            || obj.contains_key("detail")
            || obj.contains_key("errors")
        {
            let mut field_errors = BTreeMap::new();
            if let Some(errors) = obj.get("errors").and_then(Value::as_object) {
                for (field, val) in errors {
                    let joined = match val {
                        Value::Array(items) => items
                            .iter()
                            .map(value_to_message)
                            .collect::<Vec<_>>()
                            .join(", "),
                        other => value_to_message(other),
                    };
                    field_errors.insert(field.clone(), joined);
                }
            }
            return Self {
                status: obj
                    .get("status")
                    .and_then(Value::as_u64)
                    .map(|s| s as u16)
                    .unwrap_or(status),
                title: obj
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or("Error")
                    .to_string(),
                message: obj
                    .get("detail")
                    .or_else(|| obj.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("Something went wrong")
                    .to_string(),
                field_errors,
            };
        }

        if obj.contains_key("error") || obj.contains_key("message") {
            return Self {
                status,
                title: obj
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Error")
                    .to_string(),
                message: obj
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Something went wrong")
                    .to_string(),
                field_errors: BTreeMap::new(),
            };
        }

        Self {
            status,
            title: "Error".to_string(),
            message: raw.to_string(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Problem shape for failures that never produced an HTTP response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            title: "Network Error".to_string(),
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Problem shape for an authorization failure with no usable body.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            title: "Unauthorized".to_string(),
            message: "Authentication required".to_string(),
            field_errors: BTreeMap::new(),
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.status, self.message)
    }
}

fn value_to_message(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Error taxonomy for console core operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// A superseded request was aborted; never surfaced to the user
    #[error("request cancelled")]
    Cancelled,

    /// The request never reached the backend or the response was lost
    #[error("network error: {0}")]
    Network(Problem),

    /// Terminal authorization failure (refresh failed or replay re-failed)
    #[error("unauthorized: {0}")]
    Unauthorized(Problem),

    /// Non-success response from the backend, already normalized
    #[error("api error: {0}")]
    Api(Problem),

    /// Malformed response body for the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client-side configuration problem (bad base URL, bad header value)
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The normalized problem payload, when one exists.
    #[must_use]
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            ApiError::Network(p) | ApiError::Unauthorized(p) | ApiError::Api(p) => Some(p),
            _ => None,
        }
    }

    /// True for failures a list view may retry without re-authenticating.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Api(p) => p.status >= 500,
            _ => false,
        }
    }

    /// True when this failure is a silent cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
