//! Sibling ordering
//!
//! Ordered node types keep an integer `position` on every node, dense and zero-based
//! within each sibling set. Density is maintained by procedure rather than by a store
//! constraint:
//!
//! - a new node (or a node moved to a new parent) is appended after its siblings
//! - reparenting closes the gap left in the former sibling set
//! - destroying a node closes the gap among its lower siblings
//! - explicit moves renumber exactly the siblings between the old and the new slot

use crate::models::{Node, NodeFilter, NodeQuery, OrderBy, PathMatch};
use crate::operations::tree_index::position_key;
use crate::operations::{TreeIndex, TreeOperationError};
use crate::services::{CallbackScope, NodeLifecycle};

/// Which side of the reference sibling a moved node lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
}

impl Placement {
    /// Slot the moved node ends up in, given its position `np` and the reference's `op`
    pub fn target(self, np: i64, op: i64) -> i64 {
        match self {
            Placement::Above if np < op => op - 1,
            Placement::Above => op,
            Placement::Below if np > op => op + 1,
            Placement::Below if np < op => op,
            Placement::Below => op + 1,
        }
    }

    /// Position change for a sibling at `pos` (the moved node excluded)
    pub fn shift(self, np: i64, op: i64, pos: i64) -> i64 {
        match self {
            Placement::Above if np > op && op <= pos && pos < np => 1,
            Placement::Above if np < op && np < pos && pos < op => -1,
            Placement::Above if np == op && pos >= op => 1,
            Placement::Below if np > op && op < pos && pos < np => 1,
            Placement::Below if np < op && np < pos && pos <= op => -1,
            Placement::Below if np == op && pos > op => 1,
            _ => 0,
        }
    }
}

/// Sibling rank queries and position maintenance
#[derive(Clone)]
pub struct OrderingIndex {
    tree: TreeIndex,
}

impl OrderingIndex {
    pub fn new(tree: TreeIndex) -> Self {
        Self { tree }
    }

    fn ensure_ordered(&self, node: &Node) -> Result<(), TreeOperationError> {
        if self.tree.registry().resolve(&node.node_type).ordering_enabled {
            Ok(())
        } else {
            Err(TreeOperationError::invalid_operation(format!(
                "node type '{}' does not have sibling ordering enabled",
                node.node_type
            )))
        }
    }

    fn require_position(node: &Node) -> Result<i64, TreeOperationError> {
        node.position().ok_or_else(|| {
            TreeOperationError::invalid_operation(format!(
                "node '{}' has no sibling position",
                node.id
            ))
        })
    }

    //
    // QUERIES
    //

    /// Siblings ranked below the node (greater position), ascending
    pub async fn lower_siblings(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let Some(position) = node.position() else {
            return Ok(Vec::new());
        };
        Ok(self
            .sorted_siblings(node)
            .await?
            .into_iter()
            .filter(|s| s.position().is_some_and(|p| p > position))
            .collect())
    }

    /// Siblings ranked above the node (smaller position), ascending
    pub async fn higher_siblings(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let Some(position) = node.position() else {
            return Ok(Vec::new());
        };
        Ok(self
            .sorted_siblings(node)
            .await?
            .into_iter()
            .filter(|s| s.position().is_some_and(|p| p < position))
            .collect())
    }

    async fn sorted_siblings(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let mut siblings = self.tree.siblings(node).await?;
        siblings.sort_by_key(position_key);
        Ok(siblings)
    }

    async fn sorted_siblings_and_self(&self, node: &Node) -> Result<Vec<Node>, TreeOperationError> {
        let mut nodes = self.tree.siblings_and_self(node).await?;
        nodes.sort_by_key(position_key);
        Ok(nodes)
    }

    /// Last node of the sibling set (the node itself included) by position
    pub async fn lowest_sibling(&self, node: &Node) -> Result<Option<Node>, TreeOperationError> {
        Ok(self.sorted_siblings_and_self(node).await?.pop())
    }

    /// First node of the sibling set (the node itself included) by position
    pub async fn highest_sibling(&self, node: &Node) -> Result<Option<Node>, TreeOperationError> {
        Ok(self.sorted_siblings_and_self(node).await?.into_iter().next())
    }

    pub async fn is_at_top(&self, node: &Node) -> Result<bool, TreeOperationError> {
        Ok(self.higher_siblings(node).await?.is_empty())
    }

    pub async fn is_at_bottom(&self, node: &Node) -> Result<bool, TreeOperationError> {
        Ok(self.lower_siblings(node).await?.is_empty())
    }

    /// Position a node appended to its current sibling set would get
    pub async fn next_position(&self, node: &Node) -> Result<i64, TreeOperationError> {
        Ok(self
            .tree
            .siblings(node)
            .await?
            .iter()
            .filter_map(Node::position)
            .max()
            .map_or(0, |max| max + 1))
    }

    //
    // MAINTENANCE (driven by the lifecycle coordinator)
    //

    /// Append the node to its sibling set unless it already holds a slot there
    pub async fn assign_default_position(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        if node.position().is_some() && !node.path_changed() {
            return Ok(());
        }
        let position = self.next_position(node).await?;
        node.set_position(Some(position));
        Ok(())
    }

    /// Pull up every sibling ranked below a node that is about to be destroyed
    pub async fn close_sibling_gap(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<usize, TreeOperationError> {
        let Some(position) = node.position_was() else {
            return Ok(0);
        };
        self.shift_up_below(lifecycle, node, node.path_was(), position)
            .await
    }

    /// Close the gap a reparented node leaves in its former sibling set
    pub async fn reposition_former_siblings(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
    ) -> Result<usize, TreeOperationError> {
        if !node.path_changed() {
            return Ok(0);
        }
        let Some(position) = node.position_was() else {
            return Ok(0);
        };
        self.shift_up_below(lifecycle, node, node.path_was(), position)
            .await
    }

    /// Decrement every node of `path`'s sibling set ranked below `position`
    async fn shift_up_below(
        &self,
        lifecycle: &NodeLifecycle,
        node: &Node,
        path: Option<&str>,
        position: i64,
    ) -> Result<usize, TreeOperationError> {
        let query = NodeQuery::new(
            NodeFilter::new()
                .with_node_type(node.node_type.clone())
                .with_path(PathMatch::exact(path))
                .excluding(node.id.clone()),
        )
        .with_order_by(OrderBy::Position);
        let former = lifecycle.store().query_nodes(query).await?;

        let mut shifted = 0;
        for mut sibling in former {
            let Some(pos) = sibling.position() else {
                continue;
            };
            if pos > position {
                sibling.set_position(Some(pos - 1));
                Box::pin(lifecycle.save_scoped(&mut sibling, CallbackScope::Cascaded)).await?;
                shifted += 1;
            }
        }

        if shifted > 0 {
            tracing::debug!(
                "Closed sibling gap at position {} left by {} ({} renumbered)",
                position,
                node.id,
                shifted
            );
        }
        Ok(shifted)
    }

    //
    // MOVES
    //

    /// Move `node` directly above `other`, adopting `other`'s parent if needed
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use ancestry_core::services::TreeService;
    /// # use ancestry_core::models::Node;
    /// # async fn example(service: &TreeService, a: &mut Node, b: &Node) -> anyhow::Result<()> {
    /// service.ordering().move_above(service.lifecycle(), a, b).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn move_above(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
        other: &Node,
    ) -> Result<(), TreeOperationError> {
        self.relocate(lifecycle, node, other, Placement::Above).await
    }

    /// Move `node` directly below `other`, adopting `other`'s parent if needed
    pub async fn move_below(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
        other: &Node,
    ) -> Result<(), TreeOperationError> {
        self.relocate(lifecycle, node, other, Placement::Below).await
    }

    /// Move `node` above its highest sibling
    pub async fn move_to_top(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
    ) -> Result<(), TreeOperationError> {
        self.ensure_ordered(node)?;
        self.tree.refresh(node).await?;
        match self.highest_sibling(node).await? {
            Some(highest) if highest.id != node.id => {
                self.relocate(lifecycle, node, &highest, Placement::Above)
                    .await
            }
            _ => Ok(()),
        }
    }

    /// Move `node` below its lowest sibling
    pub async fn move_to_bottom(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
    ) -> Result<(), TreeOperationError> {
        self.ensure_ordered(node)?;
        self.tree.refresh(node).await?;
        match self.lowest_sibling(node).await? {
            Some(lowest) if lowest.id != node.id => {
                self.relocate(lifecycle, node, &lowest, Placement::Below)
                    .await
            }
            _ => Ok(()),
        }
    }

    async fn relocate(
        &self,
        lifecycle: &NodeLifecycle,
        node: &mut Node,
        other: &Node,
        placement: Placement,
    ) -> Result<(), TreeOperationError> {
        if node.id == other.id {
            return Ok(());
        }
        self.ensure_ordered(node)?;
        if node.node_type != other.node_type {
            return Err(TreeOperationError::invalid_operation(format!(
                "cannot order node '{}' of type '{}' against node '{}' of type '{}'",
                node.id, node.node_type, other.id, other.node_type
            )));
        }

        self.tree.refresh(node).await?;
        let mut other = self.tree.reload(other).await?;
        let joining = node.path() != other.path();
        if joining || node.is_new_record() || node.path_changed() {
            if joining {
                let parent = self.tree.parent(&other).await?;
                self.tree.set_parent(node, parent.as_ref())?;
            }
            Box::pin(lifecycle.save(node)).await?;
            other = self.tree.reload(&other).await?;
        }

        let np = Self::require_position(node)?;
        let op = Self::require_position(&other)?;
        let target = placement.target(np, op);

        let mut shifted = 0;
        for mut sibling in self.tree.siblings(node).await? {
            let Some(pos) = sibling.position() else {
                continue;
            };
            let delta = placement.shift(np, op, pos);
            if delta != 0 {
                sibling.set_position(Some(pos + delta));
                Box::pin(lifecycle.save_scoped(&mut sibling, CallbackScope::Cascaded)).await?;
                shifted += 1;
            }
        }

        node.set_position(Some(target));
        Box::pin(lifecycle.save(node)).await?;

        tracing::debug!(
            "Moved {} {:?} {}: position {} -> {} ({} sibling(s) renumbered)",
            node.id,
            placement,
            other.id,
            np,
            target,
            shifted
        );
        Ok(())
    }
}
