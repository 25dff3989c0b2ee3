//! Orphan handling on destroy
//!
//! Before a persisted node is removed, its descendants are dealt with according to the
//! node type's [`OrphanStrategy`].

use crate::behaviors::OrphanStrategy;
use crate::models::{Node, NodeFilter, NodeQuery, OrderBy, PathMatch};
use crate::operations::{PathCodec, TreeIndex, TreeOperationError};
use crate::services::{CallbackScope, NodeLifecycle};

/// Applies an orphan strategy to a node's descendants
#[derive(Clone)]
pub struct OrphanResolver {
    tree: TreeIndex,
}

impl OrphanResolver {
    pub fn new(tree: TreeIndex) -> Self {
        Self { tree }
    }

    /// Handle the descendants of `node` ahead of its removal
    ///
    /// Does nothing for nodes that were never saved. An error leaves the node in place;
    /// with `Restrict` nothing has been written at that point.
    pub async fn resolve(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
        strategy: OrphanStrategy,
    ) -> Result<(), TreeOperationError> {
        if node.is_new_record() {
            return Ok(());
        }

        match strategy {
            OrphanStrategy::Destroy => self.destroy_descendants(lifecycle, node).await,
            OrphanStrategy::Rootify => self.rootify_descendants(lifecycle, node).await,
            OrphanStrategy::Restrict => {
                let child_count = self.tree.child_count(node).await?;
                if child_count > 0 {
                    tracing::debug!(
                        "Refusing to delete {}: {} child node(s) under restrict strategy",
                        node.id,
                        child_count
                    );
                    return Err(TreeOperationError::restricted_deletion(
                        node.id.clone(),
                        child_count,
                    ));
                }
                Ok(())
            }
        }
    }

    async fn destroy_descendants(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<(), TreeOperationError> {
        let descendants = self.tree.descendants(node).await?;
        for descendant in &descendants {
            Box::pin(lifecycle.destroy_scoped(descendant, CallbackScope::Cascaded)).await?;
        }

        tracing::debug!(
            "Destroyed {} descendant(s) of {}",
            descendants.len(),
            node.id
        );
        Ok(())
    }

    async fn rootify_descendants(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<(), TreeOperationError> {
        let prefix = PathCodec::child_path_of(node)?;
        let ordered = self
            .tree
            .registry()
            .resolve(&node.node_type)
            .ordering_enabled;

        let mut next_root_position = if ordered {
            Some(self.next_root_position(lifecycle, node).await?)
        } else {
            None
        };

        let descendants = self.tree.descendants(node).await?;
        let mut rootified = 0;
        for mut descendant in descendants {
            let Some(path) = descendant.path().map(str::to_string) else {
                continue;
            };
            let Some(rebased) = PathCodec::rebase(&path, &prefix, None) else {
                continue;
            };

            if rebased.is_none() {
                // Direct child becomes a root; descendants are already in position order
                if let Some(next) = next_root_position.as_mut() {
                    descendant.set_position(Some(*next));
                    *next += 1;
                }
                rootified += 1;
            }
            descendant.set_path(rebased);
            Box::pin(lifecycle.save_scoped(&mut descendant, CallbackScope::Cascaded)).await?;
        }

        tracing::debug!("Rootified {} child node(s) of {}", rootified, node.id);
        Ok(())
    }

    /// First position after every current root
    ///
    /// The destroyed node is counted when it is a root itself; closing its gap afterwards
    /// pulls the rootified children up by one.
    async fn next_root_position(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<i64, TreeOperationError> {
        let query = NodeQuery::new(
            NodeFilter::new()
                .with_node_type(node.node_type.clone())
                .with_path(PathMatch::Root),
        )
        .with_order_by(OrderBy::Position);
        let roots = lifecycle.store().query_nodes(query).await?;
        Ok(roots
            .iter()
            .filter_map(Node::position)
            .max()
            .map_or(0, |max| max + 1))
    }
}
