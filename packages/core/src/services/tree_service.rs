//! TreeService - Tree-indexed node management
//!
//! A façade bundling a `NodeLifecycle` (with the `TreeCoordinator` registered) and the
//! tree operations. It is the usual entry point for embedders:
//!
//! ```rust,no_run
//! use ancestry_core::behaviors::{OrphanStrategy, TreeConfig, TreeConfigRegistry};
//! use ancestry_core::db::MemoryStore;
//! use ancestry_core::models::Node;
//! use ancestry_core::services::TreeService;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let registry = TreeConfigRegistry::new().register(
//!     "category",
//!     TreeConfig::with_orphan_strategy(OrphanStrategy::Rootify).ordered(),
//! );
//! let service = TreeService::new(Arc::new(MemoryStore::new()), registry);
//!
//! let root = service
//!     .create(Node::new("category".to_string(), "Root".to_string(), json!({})), None)
//!     .await?;
//! let child = service
//!     .create(Node::new("category".to_string(), "Child".to_string(), json!({})), Some(&root))
//!     .await?;
//!
//! assert_eq!(service.tree().children(&root).await?[0].id, child.id);
//! # Ok(())
//! # }
//! ```

use crate::behaviors::TreeConfigRegistry;
use crate::db::NodeStore;
use crate::models::{DeleteResult, Node};
use crate::operations::{OrderingIndex, TreeIndex, TreeOperationError};
use crate::services::{NodeLifecycle, TreeCoordinator};
use std::sync::Arc;

/// Tree-aware node service
pub struct TreeService {
    store: Arc<dyn NodeStore>,
    registry: Arc<TreeConfigRegistry>,
    lifecycle: NodeLifecycle,
    tree: TreeIndex,
    ordering: OrderingIndex,
}

impl TreeService {
    /// Create a service over a store with no additional hooks
    pub fn new(store: Arc<dyn NodeStore>, registry: TreeConfigRegistry) -> Self {
        let lifecycle = NodeLifecycle::new(store.clone());
        Self::from_lifecycle(lifecycle, registry)
    }

    /// Create a service around an existing lifecycle
    ///
    /// The tree coordinator is registered after any hooks already on `lifecycle`.
    pub fn from_lifecycle(lifecycle: NodeLifecycle, registry: TreeConfigRegistry) -> Self {
        let store = lifecycle.store().clone();
        let registry = Arc::new(registry);
        let coordinator = Arc::new(TreeCoordinator::new(store.clone(), registry.clone()));
        let tree = coordinator.tree().clone();
        let ordering = coordinator.ordering().clone();

        Self {
            store,
            registry,
            lifecycle: lifecycle.with_hook(coordinator),
            tree,
            ordering,
        }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub fn registry(&self) -> &TreeConfigRegistry {
        &self.registry
    }

    pub fn lifecycle(&self) -> &NodeLifecycle {
        &self.lifecycle
    }

    /// Tree queries and reparenting
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    /// Sibling ordering queries and moves
    pub fn ordering(&self) -> &OrderingIndex {
        &self.ordering
    }

    //
    // WRITES
    //

    /// Save a node through the lifecycle
    pub async fn save(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        self.lifecycle.save(node).await
    }

    /// Place a new node under `parent` (or at the root) and save it
    ///
    /// # Arguments
    ///
    /// * `node` - Unsaved node to insert
    /// * `parent` - Persisted parent of the same type, or `None` for a root
    pub async fn create(
        &self,
        mut node: Node,
        parent: Option<&Node>,
    ) -> Result<Node, TreeOperationError> {
        if parent.is_some() || self.registry.is_tree_enabled(&node.node_type) {
            let parent = self.tree.current_parent(parent).await?;
            self.tree.set_parent(&mut node, parent.as_ref())?;
        }
        self.lifecycle.save(&mut node).await?;
        Ok(node)
    }

    /// Reparent a node and save it, rewriting its descendants
    ///
    /// Both `node` and `new_parent` are brought up to date with the store first, so
    /// handles taken before an ancestor moved still land in the right place.
    pub async fn move_to(
        &self,
        node: &mut Node,
        new_parent: Option<&Node>,
    ) -> Result<(), TreeOperationError> {
        self.tree.refresh(node).await?;
        let new_parent = self.tree.current_parent(new_parent).await?;
        self.tree.set_parent(node, new_parent.as_ref())?;
        self.lifecycle.save(node).await
    }

    /// Reparent a node by parent id and save it
    pub async fn move_to_id(
        &self,
        node: &mut Node,
        parent_id: Option<&str>,
    ) -> Result<(), TreeOperationError> {
        self.tree.refresh(node).await?;
        self.tree.set_parent_id(node, parent_id).await?;
        self.lifecycle.save(node).await
    }

    /// Destroy a node, applying its type's orphan strategy
    pub async fn destroy(&self, node: &Node) -> Result<DeleteResult, TreeOperationError> {
        self.lifecycle.destroy(node).await
    }

    //
    // LOOKUPS
    //

    /// Get a node by id
    pub async fn get(&self, id: &str) -> Result<Option<Node>, TreeOperationError> {
        Ok(self.store.get_node(id).await?)
    }

    /// Get a node by id, failing with `NodeNotFound` if it does not exist
    pub async fn require(&self, id: &str) -> Result<Node, TreeOperationError> {
        self.get(id)
            .await?
            .ok_or_else(|| TreeOperationError::node_not_found(id))
    }

    //
    // ORDERING
    //

    pub async fn move_above(&self, node: &mut Node, other: &Node) -> Result<(), TreeOperationError> {
        self.ordering.move_above(&self.lifecycle, node, other).await
    }

    pub async fn move_below(&self, node: &mut Node, other: &Node) -> Result<(), TreeOperationError> {
        self.ordering.move_below(&self.lifecycle, node, other).await
    }

    pub async fn move_to_top(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        self.ordering.move_to_top(&self.lifecycle, node).await
    }

    pub async fn move_to_bottom(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        self.ordering.move_to_bottom(&self.lifecycle, node).await
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
