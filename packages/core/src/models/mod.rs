//! Data Models
//!
//! This module contains the data structures shared by the store, the lifecycle and the
//! tree operations:
//!
//! - `Node` - The tree-indexed record with its change-tracking baseline
//! - `NodeQuery` / `NodeFilter` / `PathMatch` - The predicate language stores implement
//! - `DeleteResult` - Outcome of an idempotent delete

mod node;
mod query;

pub use node::{DeleteResult, Node};
pub use query::{NodeFilter, NodeQuery, OrderBy, PathMatch};
