//! # List Views
//!
//! Per-entity wire bindings for the console's list pages: each view
//! declares its filter schema, its row type, and which paged shape its
//! endpoint speaks. Form schemas, routing, and page composition live
//! outside this crate.

pub mod companies;
pub mod dictionaries;
pub mod users;

use serde::Deserialize;

/// A `{id, name}` reference to another entity, as embedded in row payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}
