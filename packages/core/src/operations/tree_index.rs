//! Tree queries and reparenting over materialized paths
//!
//! `TreeIndex` answers every tree-shaped question about a node with either an in-memory
//! parse of its path or a single store query:
//!
//! | Relation     | Store predicate                                          |
//! |--------------|----------------------------------------------------------|
//! | ancestors    | `id IN ancestor_ids`                                     |
//! | children     | `path == child_path`                                     |
//! | descendants  | `path == child_path OR path starts with child_path + "/"` |
//! | siblings     | `path == node.path AND id != node.id`                    |
//!
//! Every query is scoped to the node's `node_type`. Results come back in sibling order
//! when the type has ordering enabled, otherwise in insertion order.
//!
//! # Reparenting
//!
//! [`TreeIndex::set_parent`] only changes the node in memory. The stored descendants
//! still carry the old prefix until the node is saved, at which point
//! [`TreeIndex::rewrite_descendants`] (run by the lifecycle coordinator) moves them.

use crate::behaviors::TreeConfigRegistry;
use crate::db::NodeStore;
use crate::models::{Node, NodeFilter, NodeQuery, OrderBy, PathMatch};
use crate::operations::{PathCodec, TreeOperationError};
use crate::services::{CallbackScope, NodeLifecycle};
use std::collections::HashMap;
use std::sync::Arc;

/// Tree reads and the reparent cascade
#[derive(Clone)]
pub struct TreeIndex {
    store: Arc<dyn NodeStore>,
    registry: Arc<TreeConfigRegistry>,
}

impl TreeIndex {
    /// Create a tree index over a store
    pub fn new(store: Arc<dyn NodeStore>, registry: Arc<TreeConfigRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &TreeConfigRegistry {
        &self.registry
    }

    //
    // PURE OPERATIONS
    //

    /// Ids of the node's ancestors, root first
    pub fn ancestor_ids(node: &Node) -> Result<Vec<String>, TreeOperationError> {
        PathCodec::decode(node.path())
    }

    /// Number of ancestors
    pub fn depth(node: &Node) -> Result<usize, TreeOperationError> {
        Ok(Self::ancestor_ids(node)?.len())
    }

    /// Id of the immediate parent (`None` for roots)
    pub fn parent_id(node: &Node) -> Result<Option<String>, TreeOperationError> {
        Ok(Self::ancestor_ids(node)?.pop())
    }

    /// Id of the tree's root; a root is its own root
    pub fn root_id(node: &Node) -> Result<String, TreeOperationError> {
        Ok(Self::ancestor_ids(node)?
            .into_iter()
            .next()
            .unwrap_or_else(|| node.id.clone()))
    }

    pub fn is_root(node: &Node) -> bool {
        node.path().map_or(true, str::is_empty)
    }

    /// Ancestor ids followed by the node's own id
    pub fn path_ids(node: &Node) -> Result<Vec<String>, TreeOperationError> {
        let mut ids = Self::ancestor_ids(node)?;
        ids.push(node.id.clone());
        Ok(ids)
    }

    //
    // STORE-BACKED READS
    //

    /// Result order for a node type
    pub fn order_for(&self, node_type: &str) -> OrderBy {
        if self.registry.resolve(node_type).ordering_enabled {
            OrderBy::Position
        } else {
            OrderBy::Insertion
        }
    }

    async fn query(&self, node_type: &str, filter: NodeFilter) -> Result<Vec<Node>, TreeOperationError> {
        let query = NodeQuery::new(filter.with_node_type(node_type.to_string()))
            .with_order_by(self.order_for(node_type));
        Ok(self.store.query_nodes(query).await?)
    }

    /// Load the stored copy of a node
    pub async fn reload(&self, node: &Node) -> Result<Node, TreeOperationError> {
        self.store
            .get_node(&node.id)
            .await?
            .ok_or_else(|| TreeOperationError::node_not_found(node.id.clone()))
    }

    /// Bring a persisted node's path and position up to date with the store
    ///
    /// Leaves nodes with an unsaved reparent (or never saved) untouched.
    pub async fn refresh(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        if node.is_new_record() || node.path_changed() {
            return Ok(());
        }
        let stored = self.reload(node).await?;
        node.sync_tree_fields(&stored);
        Ok(())
    }

    /// Stored copy of a prospective parent
    ///
    /// A handle can predate a move of one of its ancestors, so its child path is read
    /// from the store. Unsaved parents are returned as given for `set_parent` to reject.
    pub async fn current_parent(
        &self,
        parent: Option<&Node>,
    ) -> Result<Option<Node>, TreeOperationError> {
        match parent {
            Some(parent) if !parent.is_new_record() => Ok(Some(self.reload(parent).await?)),
            Some(parent) => Ok(Some(parent.clone())),
            None => Ok(None),
        }
    }

    /// Ancestor nodes, root first
    ///
    /// Fails with `ConsistencyViolation` if any ancestor id is missing from the store.
    pub async fn ancestors(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let ids = Self::ancestor_ids(node)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self
            .query(&node.node_type, NodeFilter::new().with_ids(ids.clone()))
            .await?;
        let mut by_id: HashMap<String, Node> =
            found.into_iter().map(|n| (n.id.clone(), n)).collect();

        ids.into_iter()
            .map(|id| {
                by_id.remove(&id).ok_or_else(|| {
                    TreeOperationError::consistency_violation(node.id.clone(), id)
                })
            })
            .collect()
    }

    /// Ancestors followed by the node itself
    pub async fn path_nodes(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let mut nodes = self.ancestors(node).await?;
        nodes.push(node.clone());
        Ok(nodes)
    }

    async fn ancestor_by_id(&self, node: &Node, id: String) -> Result<Node, TreeOperationError> {
        let mut found = self
            .query(&node.node_type, NodeFilter::new().with_ids(vec![id.clone()]))
            .await?;
        found
            .pop()
            .ok_or_else(|| TreeOperationError::consistency_violation(node.id.clone(), id))
    }

    /// Immediate parent (`None` for roots)
    pub async fn parent(&self, node: &Node) -> Result<Option<Node>, TreeOperationError> {
        match Self::parent_id(node)? {
            Some(id) => Ok(Some(self.ancestor_by_id(node, id).await?)),
            None => Ok(None),
        }
    }

    /// Root of the node's tree (the node itself if it is a root)
    pub async fn root(&self, node: &Node) -> Result<Node, TreeOperationError> {
        let root_id = Self::root_id(node)?;
        if root_id == node.id {
            return Ok(node.clone());
        }
        self.ancestor_by_id(node, root_id).await
    }

    /// Direct children of a persisted node
    pub async fn children(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let child_path = PathCodec::child_path_of(node)?;
        self.query(
            &node.node_type,
            NodeFilter::new().with_path(PathMatch::Exact(child_path)),
        )
        .await
    }

    pub async fn child_ids(&self, node: &Node) -> Result<Vec<String>, TreeOperationError> {
        Ok(ids_of(self.children(node).await?))
    }

    /// Number of direct children
    pub async fn child_count(&self, node: &Node) -> Result<usize, TreeOperationError> {
        let child_path = PathCodec::child_path_of(node)?;
        let query = NodeQuery::new(
            NodeFilter::new()
                .with_node_type(node.node_type.clone())
                .with_path(PathMatch::Exact(child_path)),
        );
        Ok(self.store.count_nodes(query).await?)
    }

    pub async fn has_children(&self, node: &Node) -> Result<bool, TreeOperationError> {
        Ok(self.child_count(node).await? > 0)
    }

    pub async fn is_childless(&self, node: &Node) -> Result<bool, TreeOperationError> {
        Ok(!self.has_children(node).await?)
    }

    /// Every node below a persisted node, at any depth
    pub async fn descendants(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let child_path = PathCodec::child_path_of(node)?;
        self.query(
            &node.node_type,
            NodeFilter::new().with_path(PathMatch::Within(child_path)),
        )
        .await
    }

    pub async fn descendant_ids(&self, node: &Node) -> Result<Vec<String>, TreeOperationError> {
        Ok(ids_of(self.descendants(node).await?))
    }

    /// The node followed by all of its descendants
    pub async fn subtree(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let mut nodes = vec![node.clone()];
        nodes.extend(self.descendants(node).await?);
        Ok(nodes)
    }

    pub async fn subtree_ids(&self, node: &Node) -> Result<Vec<String>, TreeOperationError> {
        Ok(ids_of(self.subtree(node).await?))
    }

    /// Nodes sharing the node's current path, excluding the node itself
    pub async fn siblings(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        self.query(
            &node.node_type,
            NodeFilter::new()
                .with_path(PathMatch::exact(node.path()))
                .excluding(node.id.clone()),
        )
        .await
    }

    /// Siblings including the node itself
    ///
    /// Uses the stored copy of the node when it is already in this sibling set, otherwise
    /// places the in-memory node by position (ordered types) or last.
    pub async fn siblings_and_self(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let mut nodes = self
            .query(
                &node.node_type,
                NodeFilter::new().with_path(PathMatch::exact(node.path())),
            )
            .await?;

        if !nodes.iter().any(|n| n.id == node.id) {
            let index = match self.order_for(&node.node_type) {
                OrderBy::Position => nodes
                    .iter()
                    .position(|n| position_key(n) > position_key(node))
                    .unwrap_or(nodes.len()),
                OrderBy::Insertion => nodes.len(),
            };
            nodes.insert(index, node.clone());
        }
        Ok(nodes)
    }

    pub async fn sibling_ids(&self, node: &Node) -> Result<Vec<String>, TreeOperationError> {
        Ok(ids_of(self.siblings(node).await?))
    }

    pub async fn has_siblings(&self, node: &Node) -> Result<bool, TreeOperationError> {
        let query = NodeQuery::new(
            NodeFilter::new()
                .with_node_type(node.node_type.clone())
                .with_path(PathMatch::exact(node.path()))
                .excluding(node.id.clone()),
        )
        .with_limit(1);
        Ok(self.store.count_nodes(query).await? > 0)
    }

    pub async fn is_only_child(&self, node: &Node) -> Result<bool, TreeOperationError> {
        Ok(!self.has_siblings(node).await?)
    }

    /// Every root of a node type
    pub async fn roots(&self, node_type: &str) -> Result<Vec<Node>, TreeOperationError> {
        self.query(node_type, NodeFilter::new().with_path(PathMatch::Root))
            .await
    }

    /// Nodes of a type at an exact depth
    ///
    /// Requires depth caching to be enabled for the type.
    pub async fn at_depth(
        &self,
        node_type: &str,
        depth: usize,
    ) -> Result<Vec<Node>, TreeOperationError> {
        if !self.registry.resolve(node_type).cache_depth {
            return Err(TreeOperationError::invalid_operation(format!(
                "depth queries require depth caching for node type '{}'",
                node_type
            )));
        }
        self.query(node_type, NodeFilter::new().with_depth(depth as i64))
            .await
    }

    //
    // REPARENTING
    //

    /// Place a node under `new_parent` (or make it a root) in memory
    ///
    /// The change is persisted, and the node's descendants rewritten, on the next save.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the node type is not tree-enabled, the parent was never
    ///   saved, or the parent is of a different node type
    /// - `CircularReference` if the parent is the node itself or one of its descendants
    pub fn set_parent(
        &self,
        node: &mut Node,
        new_parent: Option<&Node>,
    ) -> Result<(), TreeOperationError> {
        if !self.registry.is_tree_enabled(&node.node_type) {
            return Err(TreeOperationError::invalid_operation(format!(
                "node type '{}' is not tree-enabled",
                node.node_type
            )));
        }
        PathCodec::validate_id(&node.id)?;

        let Some(parent) = new_parent else {
            node.set_path(None);
            return Ok(());
        };

        if parent.is_new_record() {
            return Err(TreeOperationError::invalid_operation(format!(
                "parent '{}' must be saved before nodes can be placed under it",
                parent.id
            )));
        }
        if parent.node_type != node.node_type {
            return Err(TreeOperationError::invalid_operation(format!(
                "parent '{}' of type '{}' cannot hold node '{}' of type '{}'",
                parent.id, parent.node_type, node.id, node.node_type
            )));
        }
        if parent.id == node.id
            || PathCodec::decode(parent.path_was())?.contains(&node.id)
            || PathCodec::decode(parent.path())?.contains(&node.id)
        {
            return Err(TreeOperationError::circular_reference(
                node.id.clone(),
                parent.id.clone(),
            ));
        }

        node.set_path(Some(PathCodec::child_path_of(parent)?));
        Ok(())
    }

    /// Like [`TreeIndex::set_parent`], resolving the parent by id from the store
    pub async fn set_parent_id(
        &self,
        node: &mut Node,
        parent_id: Option<&str>,
    ) -> Result<(), TreeOperationError> {
        let parent = match parent_id {
            Some(id) => Some(
                self.store
                    .get_node(id)
                    .await?
                    .ok_or_else(|| TreeOperationError::node_not_found(id))?,
            ),
            None => None,
        };
        self.set_parent(node, parent.as_ref())
    }

    /// Move the stored descendants of a reparented node onto its new child path
    ///
    /// Descendants are located by the baseline child path and saved one by one with
    /// `CallbackScope::Cascaded`. The writes are independent: a failure part-way leaves
    /// the already-saved descendants under the new prefix.
    ///
    /// Returns the number of rewritten descendants.
    pub async fn rewrite_descendants(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<usize, TreeOperationError> {
        if !node.path_changed() {
            return Ok(0);
        }

        let old_prefix = PathCodec::child_path_of(node)?;
        let new_prefix = PathCodec::current_child_path_of(node)?;
        let descendants = self
            .query(
                &node.node_type,
                NodeFilter::new().with_path(PathMatch::Within(old_prefix.clone())),
            )
            .await?;

        let mut rewritten = 0;
        for mut descendant in descendants {
            let Some(path) = descendant.path().map(str::to_string) else {
                continue;
            };
            let rebased = PathCodec::rebase(&path, &old_prefix, Some(new_prefix.as_str()));
            if let Some(rebased) = rebased {
                descendant.set_path(rebased);
                Box::pin(lifecycle.save_scoped(&mut descendant, CallbackScope::Cascaded))
                    .await?;
                rewritten += 1;
            }
        }

        tracing::debug!(
            "Rewrote {} descendant path(s) of {}: {} -> {}",
            rewritten,
            node.id,
            old_prefix,
            new_prefix
        );
        Ok(rewritten)
    }
}

/// Sort key matching `OrderBy::Position`: positioned nodes first, ascending
pub(crate) fn position_key(node: &Node) -> (bool, i64) {
    match node.position() {
        Some(position) => (false, position),
        None => (true, 0),
    }
}

fn ids_of(nodes: Vec<Node>) -> Vec<String> {
    nodes.into_iter().map(|n| n.id).collect()
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "tree_index_test.rs"]
mod tree_index_test;
