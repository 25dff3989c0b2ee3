//! Tree lifecycle coordinator
//!
//! Binds the tree operations into the save/destroy lifecycle. Registered once on a
//! `NodeLifecycle`, it runs for every node type present in the `TreeConfigRegistry` and
//! ignores all other types.
//!
//! # Hook Order
//!
//! ```text
//! before_save     rewrite descendants -> cache depth -> assign default position
//!                 -> reposition former siblings
//! after_save      reset change baseline
//! before_destroy  apply orphan strategy -> close sibling gap
//! ```
//!
//! Only depth caching and the baseline reset run for cascaded writes.

use crate::behaviors::TreeConfigRegistry;
use crate::db::NodeStore;
use crate::models::Node;
use crate::operations::{OrderingIndex, OrphanResolver, PathCodec, TreeIndex, TreeOperationError};
use crate::services::{CallbackScope, LifecycleHook, NodeLifecycle};
use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle hook maintaining paths, positions and orphans for tree-enabled types
pub struct TreeCoordinator {
    registry: Arc<TreeConfigRegistry>,
    tree: TreeIndex,
    ordering: OrderingIndex,
    orphans: OrphanResolver,
}

impl TreeCoordinator {
    pub fn new(store: Arc<dyn NodeStore>, registry: Arc<TreeConfigRegistry>) -> Self {
        let tree = TreeIndex::new(store, registry.clone());
        let ordering = OrderingIndex::new(tree.clone());
        let orphans = OrphanResolver::new(tree.clone());
        Self {
            registry,
            tree,
            ordering,
            orphans,
        }
    }

    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    pub fn ordering(&self) -> &OrderingIndex {
        &self.ordering
    }
}

#[async_trait]
impl LifecycleHook for TreeCoordinator {
    async fn before_save(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
        scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        let Some(config) = self.registry.get(&node.node_type) else {
            return Ok(());
        };
        PathCodec::validate_id(&node.id)?;

        let reparented = node.path_changed();
        if reparented && !scope.is_cascaded() {
            self.tree.rewrite_descendants(lifecycle, node).await?;
        }

        if config.cache_depth {
            let depth = TreeIndex::depth(node)? as i64;
            node.set_cached_depth(Some(depth));
        }

        if config.ordering_enabled && !scope.is_cascaded() {
            self.ordering.assign_default_position(node).await?;
            if reparented {
                self.ordering
                    .reposition_former_siblings(lifecycle, node)
                    .await?;
            }
        }
        Ok(())
    }

    async fn after_save(
        &self,
        _lifecycle: &NodeLifecycle,
        node: &mut Node,
        _scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        if self.registry.is_tree_enabled(&node.node_type) {
            node.reset_tree_baseline();
        }
        Ok(())
    }

    async fn before_destroy(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
        scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        if scope.is_cascaded() || node.is_new_record() {
            return Ok(());
        }
        let Some(config) = self.registry.get(&node.node_type) else {
            return Ok(());
        };
        // Orphans and siblings are located from the stored path, not the caller's handle
        let Some(stored) = lifecycle.store().get_node(&node.id).await? else {
            tracing::debug!("{} is already gone, nothing to resolve", node.id);
            return Ok(());
        };

        self.orphans
            .resolve(lifecycle, &stored, config.orphan_strategy)
            .await?;
        tracing::debug!(
            "Applied {:?} orphan strategy for {}",
            config.orphan_strategy,
            stored.id
        );

        if config.ordering_enabled {
            self.ordering.close_sibling_gap(lifecycle, &stored).await?;
        }
        Ok(())
    }
}
