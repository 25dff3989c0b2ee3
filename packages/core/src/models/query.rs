//! Store query types
//!
//! `NodeQuery` is the predicate language every `NodeStore` must understand. It is kept
//! deliberately small: type equality, id-set membership, path equality, path prefix, id
//! exclusion and cached-depth equality. That is enough to answer every tree query in a
//! single round-trip.

use super::Node;
use serde::{Deserialize, Serialize};

/// Predicate on the materialized path column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PathMatch {
    /// Path is absent (root nodes)
    Root,
    /// Path equals the given value exactly
    Exact(String),
    /// Path equals the given prefix, or starts with the prefix followed by the delimiter
    Within(String),
}

impl PathMatch {
    /// Exact match against an optional path (`None` matches roots)
    pub fn exact(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::Exact(path.to_string()),
            None => Self::Root,
        }
    }
}

/// Sort order for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
    /// Order in which nodes were first stored
    #[default]
    Insertion,
    /// Ascending sibling position (missing positions last), ties by insertion order
    Position,
}

/// Node filter for query operations
///
/// All populated fields are combined with AND.
///
/// # Examples
///
/// ```rust
/// # use ancestry_core::models::{NodeFilter, PathMatch};
/// let filter = NodeFilter::new()
///     .with_node_type("category".to_string())
///     .with_path(PathMatch::Within("root-id".to_string()));
/// assert!(filter.node_type.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFilter {
    /// Filter by node type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    /// Only nodes whose id is in this set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Predicate on the path column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathMatch>,

    /// Exclude a single node by id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_id: Option<String>,

    /// Filter by cached depth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i64>,
}

impl NodeFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by node type
    pub fn with_node_type(mut self, node_type: String) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Filter by a set of ids
    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Filter on the path column
    pub fn with_path(mut self, path: PathMatch) -> Self {
        self.path = Some(path);
        self
    }

    /// Exclude a node by id
    pub fn excluding(mut self, id: String) -> Self {
        self.exclude_id = Some(id);
        self
    }

    /// Filter by cached depth
    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Evaluate the filter against a node held in memory
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(node_type) = &self.node_type {
            if &node.node_type != node_type {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &node.id) {
                return false;
            }
        }
        if let Some(exclude_id) = &self.exclude_id {
            if &node.id == exclude_id {
                return false;
            }
        }
        if let Some(depth) = self.depth {
            if node.cached_depth() != Some(depth) {
                return false;
            }
        }
        match (&self.path, node.path()) {
            (None, _) => true,
            (Some(PathMatch::Root), path) => path.is_none(),
            (Some(PathMatch::Exact(expected)), Some(path)) => path == expected,
            (Some(PathMatch::Within(prefix)), Some(path)) => {
                path == prefix
                    || (path.len() > prefix.len()
                        && path.starts_with(prefix.as_str())
                        && path.as_bytes()[prefix.len()] == b'/')
            }
            (Some(_), None) => false,
        }
    }
}

/// Query passed to `NodeStore::query_nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeQuery {
    /// Row predicate
    pub filter: NodeFilter,

    /// Result ordering
    #[serde(default)]
    pub order_by: OrderBy,

    /// Limit number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl NodeQuery {
    /// Create a new query from a filter, in insertion order
    pub fn new(filter: NodeFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Set result ordering
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Set result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_at(id: &str, path: Option<&str>) -> Node {
        let mut node = Node::new_with_id(
            id.to_string(),
            "category".to_string(),
            id.to_string(),
            json!({}),
        );
        node.set_path(path.map(str::to_string));
        node
    }

    #[test]
    fn test_within_matches_prefix_on_segment_boundary() {
        let filter = NodeFilter::new().with_path(PathMatch::Within("a".to_string()));

        assert!(filter.matches(&node_at("x", Some("a"))));
        assert!(filter.matches(&node_at("y", Some("a/b"))));
        assert!(!filter.matches(&node_at("z", Some("ab"))));
        assert!(!filter.matches(&node_at("r", None)));
    }

    #[test]
    fn test_root_and_exact_matching() {
        let root = node_at("r", None);
        let child = node_at("c", Some("r"));

        let roots = NodeFilter::new().with_path(PathMatch::exact(None));
        assert!(roots.matches(&root));
        assert!(!roots.matches(&child));

        let children = NodeFilter::new().with_path(PathMatch::exact(Some("r")));
        assert!(children.matches(&child));
        assert!(!children.matches(&root));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let node = node_at("c", Some("r"));
        let filter = NodeFilter::new()
            .with_node_type("category".to_string())
            .with_ids(vec!["c".to_string(), "d".to_string()]);
        assert!(filter.matches(&node));
        assert!(!filter.clone().excluding("c".to_string()).matches(&node));
        assert!(!filter.with_node_type("menu".to_string()).matches(&node));
    }
}
