//! Thingsearch: the query-compilation core of a multi-tenant thing search index.
//!
//! Criteria trees built by an external query parser are compiled into native BSON filter
//! documents for a document store. Every field comparison is conjoined with a field-level
//! authorization filter derived from the caller's subject ids, so a compiled filter never
//! matches a value the caller is not allowed to see.
//!
//! # Architecture
//! - Field expressions (logical path -> physical path + authorization ancestor chain)
//! - Predicates and criteria (the query AST)
//! - Authorization filter synthesis (per-ancestor grant/revoke checks)
//! - Criteria and sort compilers producing BSON documents
//! - Index schema describing the physical document layout

mod schema;
mod field;
mod predicate;
mod criteria;
mod auth;
mod compiler;
mod sort;
mod filter;
mod context;
mod types;

pub use schema::*;
pub use field::*;
pub use predicate::*;
pub use criteria::*;
pub use auth::*;
pub use compiler::*;
pub use sort::*;
pub use filter::*;
pub use context::*;
pub use types::*;

use thiserror::Error;

/// Unified error type for Thingsearch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThingSearchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T, E = ThingSearchError> = std::result::Result<T, E>;
