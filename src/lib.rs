#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CRM Console Core
//!
//! The engine behind the console's data-bound list pages and its REST
//! session: a query-driven list engine and an authenticated transport with
//! single-flight credential refresh.
//!
//! ## Overview
//!
//! Almost everything user-facing in the console is a routed form over a
//! REST backend. The two parts with real coordination work live here:
//!
//! - the **list engine**, which turns bursts of uncommitted filter edits
//!   into a stable server-bound query and guarantees that only the most
//!   recently issued fetch ever reaches visible state, and
//! - the **authenticated transport**, which refreshes an expired credential
//!   exactly once under concurrent load and replays every request that was
//!   blocked on that refresh.
//!
//! Both solve the same class of problem — coordinating cancellable async
//! operations without duplicate work or stale overwrites — and share the
//! same HTTP boundary.
//!
//! ## Module Organization
//!
//! - [`query`] - Query state store, debounced filter synchronizer, executor
//! - [`transport`] - Authenticated transport, refresh machine, page adapters
//! - [`options`] - Debounce-and-cancel option lookups for remote dropdowns
//! - [`session`] - Process-wide session state and bootstrap latch
//! - [`auth`] - Login, logout, and identity bootstrap flows
//! - [`views`] - Per-entity filter schemas and wire bindings
//! - [`config`] - Client configuration
//! - [`error`] - Normalized problem shape and error taxonomy
//! - [`logging`] - Structured logging initialization

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod options;
pub mod query;
pub mod session;
pub mod transport;
pub mod views;

// Re-export commonly used types for convenience
pub use auth::AuthApi;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, Problem};
pub use options::{OptionFetcher, OptionProvider, OptionsSnapshot, SelectOption};
pub use query::{
    FilterEditor, FilterRejected, FilterSchema, ListEngine, ListFetcher, ListSnapshot,
    QueryExecutor, QueryState, QueryStateStore, SortDir,
};
pub use session::{Principal, Session, SessionStore};
pub use transport::paging::{PageAdapter, PagedResult};
pub use transport::{AuthTransport, HttpExec, RawResponse, RequestSpec};
