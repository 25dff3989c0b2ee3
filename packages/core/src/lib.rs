//! Ancestry Core - Materialized-Path Tree Index
//!
//! This crate keeps an arbitrary-depth tree over a flat collection of records. Each
//! record stores a single string encoding its chain of ancestor ids, plus an optional
//! integer rank among its siblings.
//!
//! # Architecture
//!
//! - **Materialized paths**: `ancestors`, `children`, `siblings` and `descendants` are
//!   each one equality or prefix query; no recursive joins
//! - **Cascading reparent**: moving a node rewrites every descendant path on save
//! - **Dense sibling positions**: ordered types keep positions `0..n` per sibling set
//! - **Orphan strategies**: destroy, rootify or restrict when a node with children goes
//! - **Pluggable stores**: in-memory or embedded libsql/Turso behind the `NodeStore` trait
//!
//! # Modules
//!
//! - [`models`] - Node record and store query types
//! - [`behaviors`] - Per-type tree configuration registry
//! - [`operations`] - Path codec, tree index, ordering and orphan handling
//! - [`services`] - Save/destroy lifecycle, tree coordinator and `TreeService` façade
//! - [`db`] - Store trait and backends

pub mod behaviors;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use behaviors::*;
pub use models::*;
pub use operations::{OrderingIndex, PathCodec, TreeIndex, TreeOperationError};
pub use services::*;
