//! NodeStore Trait - Record Store Abstraction
//!
//! This module defines the `NodeStore` trait: the flat record collection the tree index
//! is layered over. The tree code never walks parent pointers; every tree query is
//! expressed as a single `NodeQuery` using type equality, id membership, path equality
//! or path prefix matching.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded (libsql) and in-process
//!    (`MemoryStore`) backends share one interface
//! 2. **Upsert Writes**: `save_node` inserts or replaces by id; the lifecycle decides
//!    whether a record is new
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context
//! 4. **No Transactions**: Every call is an independent point operation
//!
//! # Examples
//!
//! ```rust,no_run
//! use ancestry_core::db::{MemoryStore, NodeStore};
//! use ancestry_core::models::{Node, NodeFilter, NodeQuery, PathMatch};
//! use std::sync::Arc;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
//!
//!     let node = Node::new("category".to_string(), "Root".to_string(), json!({}));
//!     store.save_node(&node).await?;
//!
//!     let roots = store
//!         .query_nodes(NodeQuery::new(
//!             NodeFilter::new()
//!                 .with_node_type("category".to_string())
//!                 .with_path(PathMatch::Root),
//!         ))
//!         .await?;
//!     assert_eq!(roots.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::models::{DeleteResult, Node, NodeQuery};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared behind an `Arc`
/// across tasks.
///
/// # Loaded Nodes
///
/// Every node returned by `get_node` or `query_nodes` must have had
/// [`Node::mark_loaded`] called on it, so its change-tracking baseline matches the
/// stored row.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// Returns `None` if the node does not exist.
    async fn get_node(&self, id: &str) -> Result<Option<Node>>;

    /// Query nodes matching a filter
    ///
    /// # Arguments
    ///
    /// * `query` - Predicate, ordering and limit
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use ancestry_core::db::NodeStore;
    /// # use ancestry_core::models::{NodeFilter, NodeQuery, OrderBy, PathMatch};
    /// # async fn example(store: &dyn NodeStore) -> anyhow::Result<()> {
    /// // All descendants of a node whose child path is "root-id/child-id"
    /// let query = NodeQuery::new(
    ///     NodeFilter::new()
    ///         .with_node_type("category".to_string())
    ///         .with_path(PathMatch::Within("root-id/child-id".to_string())),
    /// )
    /// .with_order_by(OrderBy::Position);
    /// let descendants = store.query_nodes(query).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn query_nodes(&self, query: NodeQuery) -> Result<Vec<Node>>;

    /// Insert or replace a node by id
    ///
    /// Replacing a node keeps its original insertion rank.
    async fn save_node(&self, node: &Node) -> Result<()>;

    /// Delete a node by id
    ///
    /// Idempotent: deleting a missing node returns `DeleteResult { existed: false }`.
    async fn delete_node(&self, id: &str) -> Result<DeleteResult>;

    /// Count nodes matching a query
    ///
    /// The default implementation materializes the matching nodes.
    async fn count_nodes(&self, query: NodeQuery) -> Result<usize> {
        Ok(self.query_nodes(query).await?.len())
    }
}
