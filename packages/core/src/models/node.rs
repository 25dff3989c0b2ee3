//! Node Data Structures
//!
//! This module defines the `Node` struct stored in the flat record collection and
//! indexed as a tree through its materialized path.
//!
//! # Architecture
//!
//! - **Flat storage**: every node is an independent record; there are no parent pointers
//! - **Materialized path**: `path` holds the `/`-joined ids of all ancestors, root first
//! - **Ordered siblings**: `position` ranks a node among nodes sharing the same path
//! - **Change tracking**: the last-persisted path and position are kept as a baseline so a
//!   reparent can still find the descendants whose stored paths reflect the old location
//!
//! # Examples
//!
//! ```rust
//! use ancestry_core::models::Node;
//! use serde_json::json;
//!
//! let node = Node::new("category".to_string(), "Hardware".to_string(), json!({}));
//! assert!(node.is_new_record());
//! assert!(node.path().is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Last-persisted tree fields of a node.
///
/// Captured when the node is loaded from the store and reset after every save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TreeBaseline {
    pub(crate) path: Option<String>,
    pub(crate) position: Option<i64>,
}

/// A record in the tree-indexed collection.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4 unless provided)
/// - `node_type`: Collection the node lives in; all tree queries are scoped to it
/// - `content`: Primary content of the node
/// - `path`: Materialized ancestor path (`None` = root)
/// - `position`: Rank among siblings (only maintained for ordered types)
/// - `depth`: Cached ancestor count (only maintained when depth caching is enabled)
/// - `created_at` / `modified_at`: Timestamps stamped by the lifecycle
/// - `properties`: Free-form JSON payload
///
/// The tree fields are not publicly writable. A path is only ever derived from a persisted
/// parent's child path, which is what keeps a node's own id out of its own path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Node type (the collection this tree lives in)
    pub node_type: String,

    /// Primary content of the node
    pub content: String,

    /// Materialized ancestor path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) path: Option<String>,

    /// Rank among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) position: Option<i64>,

    /// Cached depth (number of ancestors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) depth: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,

    /// Entity-specific fields
    pub properties: serde_json::Value,

    #[serde(skip)]
    pub(crate) persisted: bool,

    #[serde(skip)]
    pub(crate) baseline: TreeBaseline,
}

impl Node {
    /// Create a new, unsaved root node with an auto-generated UUID
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ancestry_core::models::Node;
    /// # use serde_json::json;
    /// let node = Node::new("category".to_string(), "Books".to_string(), json!({}));
    /// assert!(!node.id.is_empty());
    /// assert!(node.position().is_none());
    /// ```
    pub fn new(node_type: String, content: String, properties: serde_json::Value) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), node_type, content, properties)
    }

    /// Create a new, unsaved root node with an explicit identifier
    ///
    /// The identifier must not contain the path delimiter (`/`); this is checked when the
    /// node's child path is first computed.
    pub fn new_with_id(
        id: String,
        node_type: String,
        content: String,
        properties: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            node_type,
            content,
            path: None,
            position: None,
            depth: None,
            created_at: now,
            modified_at: now,
            properties,
            persisted: false,
            baseline: TreeBaseline::default(),
        }
    }

    /// Set an explicit sibling position before the first save
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Whether this node has never been saved
    pub fn is_new_record(&self) -> bool {
        !self.persisted
    }

    /// Current (possibly unsaved) materialized path
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Path as of the last load or save
    pub fn path_was(&self) -> Option<&str> {
        self.baseline.path.as_deref()
    }

    /// Whether a persisted node has been reparented since its last save
    ///
    /// Always `false` for new records: they have no stored location to move away from.
    pub fn path_changed(&self) -> bool {
        self.persisted && self.path != self.baseline.path
    }

    /// Current sibling position
    pub fn position(&self) -> Option<i64> {
        self.position
    }

    /// Position as of the last load or save
    pub fn position_was(&self) -> Option<i64> {
        self.baseline.position
    }

    /// Whether the position differs from its baseline
    pub fn position_changed(&self) -> bool {
        self.position != self.baseline.position
    }

    /// Set the sibling position; persisted on the next save
    pub fn set_position(&mut self, position: Option<i64>) {
        self.position = position;
    }

    /// Cached depth, if the node type caches depth
    pub fn cached_depth(&self) -> Option<i64> {
        self.depth
    }

    /// Update the node's content
    pub fn set_content(&mut self, content: String) {
        self.content = content;
        self.modified_at = Utc::now();
    }

    /// Mark a node as loaded from the store.
    ///
    /// Store implementations call this on every node they return so the node counts as
    /// persisted and its tree baseline matches the stored row.
    pub fn mark_loaded(&mut self) {
        self.persisted = true;
        self.reset_tree_baseline();
    }

    pub(crate) fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    pub(crate) fn set_cached_depth(&mut self, depth: Option<i64>) {
        self.depth = depth;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.persisted = true;
    }

    /// Copy the stored tree fields (and their baseline) from a freshly loaded copy
    pub(crate) fn sync_tree_fields(&mut self, stored: &Node) {
        self.path = stored.path.clone();
        self.position = stored.position;
        self.depth = stored.depth;
        self.persisted = true;
        self.baseline = stored.baseline.clone();
    }

    pub(crate) fn reset_tree_baseline(&mut self) {
        self.baseline = TreeBaseline {
            path: self.path.clone(),
            position: self.position,
        };
    }
}

/// Result of a delete operation
///
/// Deleting a missing node is not an error; `existed` reports whether a row was removed.
///
/// # Examples
///
/// ```rust
/// use ancestry_core::models::DeleteResult;
///
/// assert!(DeleteResult::existed().existed);
/// assert!(!DeleteResult::not_found().existed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    /// Whether the node existed before deletion
    pub existed: bool,
}

impl DeleteResult {
    /// Create a DeleteResult indicating the node existed
    pub fn existed() -> Self {
        Self { existed: true }
    }

    /// Create a DeleteResult indicating the node didn't exist
    pub fn not_found() -> Self {
        Self { existed: false }
    }
}
