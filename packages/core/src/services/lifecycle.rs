//! Save/Destroy Lifecycle
//!
//! `NodeLifecycle` is the generic driver every write goes through. It runs registered
//! [`LifecycleHook`]s around the store call:
//!
//! ```text
//! save:    before_save hooks -> stamp modified_at -> store.save_node -> after_save hooks
//! destroy: before_destroy hooks -> store.delete_node
//! ```
//!
//! Any hook error aborts the operation at that point and is returned to the caller.
//!
//! # Callback Scope
//!
//! Writes issued by a hook on behalf of another node (a descendant rewritten during a
//! reparent, a sibling renumbered during a move) are performed with
//! [`CallbackScope::Cascaded`]. Hooks receive the scope and skip their tree work for
//! cascaded writes, so a cascade never re-enters itself.

use crate::db::NodeStore;
use crate::models::{DeleteResult, Node};
use crate::operations::TreeOperationError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Whether a write was requested by a caller or issued by a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackScope {
    /// Requested directly by a caller; hooks run their full logic
    TopLevel,
    /// Issued by a hook as a side effect of another node's write
    Cascaded,
}

impl CallbackScope {
    pub fn is_cascaded(self) -> bool {
        matches!(self, Self::Cascaded)
    }
}

/// Hook points of the save/destroy lifecycle
///
/// All methods default to doing nothing. Returning an error aborts the write.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Runs before the node's row is written
    async fn before_save(
        &self,
        _lifecycle: &NodeLifecycle,
        _node: &mut Node,
        _scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        Ok(())
    }

    /// Runs after the node's row has been written
    async fn after_save(
        &self,
        _lifecycle: &NodeLifecycle,
        _node: &mut Node,
        _scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        Ok(())
    }

    /// Runs before the node's row is removed
    async fn before_destroy(
        &self,
        _lifecycle: &NodeLifecycle,
        _node: &Node,
        _scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        Ok(())
    }
}

/// Drives saves and destroys through the registered hooks
///
/// # Examples
///
/// ```rust,no_run
/// use ancestry_core::db::MemoryStore;
/// use ancestry_core::models::Node;
/// use ancestry_core::services::NodeLifecycle;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let lifecycle = NodeLifecycle::new(Arc::new(MemoryStore::new()));
/// let mut node = Node::new("note".to_string(), "Hello".to_string(), json!({}));
/// lifecycle.save(&mut node).await?;
/// assert!(!node.is_new_record());
/// # Ok(())
/// # }
/// ```
pub struct NodeLifecycle {
    store: Arc<dyn NodeStore>,
    hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl NodeLifecycle {
    /// Create a lifecycle with no hooks
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    /// Register a hook; hooks run in registration order
    pub fn with_hook(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// The store writes are sent to
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Save a node as a top-level write
    pub async fn save(&self, node: &mut Node) -> Result<(), TreeOperationError> {
        self.save_scoped(node, CallbackScope::TopLevel).await
    }

    /// Save a node, passing `scope` to every hook
    ///
    /// On success the node is marked persisted.
    pub async fn save_scoped(
        &self,
        node: &mut Node,
        scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        for hook in &self.hooks {
            hook.before_save(self, node, scope).await?;
        }

        node.modified_at = Utc::now();
        self.store.save_node(node).await?;
        node.mark_saved();

        for hook in &self.hooks {
            hook.after_save(self, node, scope).await?;
        }
        Ok(())
    }

    /// Destroy a node as a top-level write
    pub async fn destroy(&self, node: &Node) -> Result<DeleteResult, TreeOperationError> {
        self.destroy_scoped(node, CallbackScope::TopLevel).await
    }

    /// Destroy a node, passing `scope` to every hook
    ///
    /// Destroying a node that is not in the store is not an error.
    pub async fn destroy_scoped(
        &self,
        node: &Node,
        scope: CallbackScope,
    ) -> Result<DeleteResult, TreeOperationError> {
        for hook in &self.hooks {
            hook.before_destroy(self, node, scope).await?;
        }

        Ok(self.store.delete_node(&node.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHook {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LifecycleHook for RecordingHook {
        async fn before_save(
            &self,
            _lifecycle: &NodeLifecycle,
            node: &mut Node,
            scope: CallbackScope,
        ) -> Result<(), TreeOperationError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("before_save:{}:{:?}:{}", node.id, scope, node.is_new_record()));
            Ok(())
        }

        async fn after_save(
            &self,
            _lifecycle: &NodeLifecycle,
            node: &mut Node,
            _scope: CallbackScope,
        ) -> Result<(), TreeOperationError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("after_save:{}:{}", node.id, node.is_new_record()));
            Ok(())
        }

        async fn before_destroy(
            &self,
            _lifecycle: &NodeLifecycle,
            node: &Node,
            scope: CallbackScope,
        ) -> Result<(), TreeOperationError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("before_destroy:{}:{:?}", node.id, scope));
            Ok(())
        }
    }

    struct RejectingHook;

    #[async_trait]
    impl LifecycleHook for RejectingHook {
        async fn before_destroy(
            &self,
            _lifecycle: &NodeLifecycle,
            node: &Node,
            _scope: CallbackScope,
        ) -> Result<(), TreeOperationError> {
            Err(TreeOperationError::invalid_operation(format!(
                "node '{}' is locked",
                node.id
            )))
        }
    }

    #[tokio::test]
    async fn test_hooks_run_around_store_calls() {
        let hook = Arc::new(RecordingHook::default());
        let lifecycle = NodeLifecycle::new(Arc::new(MemoryStore::new())).with_hook(hook.clone());

        let mut node = Node::new_with_id(
            "n1".to_string(),
            "note".to_string(),
            "body".to_string(),
            json!({}),
        );
        lifecycle.save(&mut node).await.unwrap();
        lifecycle
            .destroy_scoped(&node, CallbackScope::Cascaded)
            .await
            .unwrap();

        let events = hook.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "before_save:n1:TopLevel:true",
                "after_save:n1:false",
                "before_destroy:n1:Cascaded",
            ]
        );
    }

    #[tokio::test]
    async fn test_hook_error_aborts_destroy() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = NodeLifecycle::new(store.clone()).with_hook(Arc::new(RejectingHook));

        let mut node = Node::new("note".to_string(), "body".to_string(), json!({}));
        lifecycle.save(&mut node).await.unwrap();

        let err = lifecycle.destroy(&node).await.unwrap_err();
        assert!(matches!(err, TreeOperationError::InvalidOperation { .. }));
        assert!(store.get_node(&node.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_destroy_missing_node_reports_not_found() {
        let lifecycle = NodeLifecycle::new(Arc::new(MemoryStore::new()));
        let node = Node::new("note".to_string(), "never saved".to_string(), json!({}));

        let result = lifecycle.destroy(&node).await.unwrap();
        assert!(!result.existed);
    }
}
