//! # Query-Driven List Engine
//!
//! Reconciles rapid, uncommitted filter edits into a stable, server-bound
//! query state, and guarantees that only the most recently issued fetch
//! ever reaches visible state. The pieces compose per list view:
//!
//! raw edits → [`debounce::FilterEditor`] → [`state::QueryStateStore`] →
//! [`executor::QueryExecutor`] → rendered rows/pagination, with
//! [`engine::ListEngine`] owning the wiring.

pub mod debounce;
pub mod engine;
pub mod executor;
pub mod state;

pub use debounce::{spawn_synchronizer, FilterEditor};
pub use engine::ListEngine;
pub use executor::{ListFetcher, ListSnapshot, QueryExecutor};
pub use state::{FilterRejected, FilterSchema, QueryState, QueryStateStore, SortDir};
