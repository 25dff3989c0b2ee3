//! Lifecycle Integration Tests
//!
//! Custom hooks next to the tree coordinator, and what a failing store leaves behind.
//! Writes are not transactional: a store error midway through a cascade leaves the
//! descendants already rewritten in place.

mod common;

use ancestry_core::db::{MemoryStore, NodeStore};
use ancestry_core::models::{DeleteResult, Node, NodeQuery};
use ancestry_core::operations::TreeOperationError;
use ancestry_core::services::{CallbackScope, LifecycleHook, NodeLifecycle, TreeService};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::{create, fetch, init_tracing, registry};
use std::sync::{Arc, Mutex};

/// Delegates to a `MemoryStore`, refusing to save one id
struct FailingStore {
    inner: MemoryStore,
    fail_on: Mutex<Option<String>>,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on: Mutex::new(None),
        }
    }

    fn fail_saves_of(&self, id: &str) {
        *self.fail_on.lock().unwrap() = Some(id.to_string());
    }
}

#[async_trait]
impl NodeStore for FailingStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        self.inner.get_node(id).await
    }

    async fn query_nodes(&self, query: NodeQuery) -> Result<Vec<Node>> {
        self.inner.query_nodes(query).await
    }

    async fn save_node(&self, node: &Node) -> Result<()> {
        let refused = self.fail_on.lock().unwrap().as_deref() == Some(node.id.as_str());
        if refused {
            return Err(anyhow!("disk full while writing {}", node.id));
        }
        self.inner.save_node(node).await
    }

    async fn delete_node(&self, id: &str) -> Result<DeleteResult> {
        self.inner.delete_node(id).await
    }
}

/// Records `(id, scope)` for every save it sees
#[derive(Default)]
struct ScopeRecorder {
    saves: Mutex<Vec<(String, CallbackScope)>>,
}

#[async_trait]
impl LifecycleHook for ScopeRecorder {
    async fn before_save(
        &self,
        _lifecycle: &NodeLifecycle,
        node: &mut Node,
        scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        self.saves.lock().unwrap().push((node.id.clone(), scope));
        Ok(())
    }
}

/// Refuses to destroy nodes whose content is "pinned"
struct PinGuard;

#[async_trait]
impl LifecycleHook for PinGuard {
    async fn before_destroy(
        &self,
        _lifecycle: &NodeLifecycle,
        node: &Node,
        _scope: CallbackScope,
    ) -> Result<(), TreeOperationError> {
        if node.content == "pinned" {
            return Err(TreeOperationError::invalid_operation(format!(
                "node '{}' is pinned",
                node.id
            )));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_cascaded_saves_are_reported_as_cascaded() -> Result<()> {
    init_tracing();
    let recorder = Arc::new(ScopeRecorder::default());
    let lifecycle = NodeLifecycle::new(Arc::new(MemoryStore::new())).with_hook(recorder.clone());
    let service = TreeService::from_lifecycle(lifecycle, registry());

    let root = create(&service, "category", "R", None).await?;
    let mut child = create(&service, "category", "C", Some(&root)).await?;
    create(&service, "category", "G", Some(&child)).await?;
    recorder.saves.lock().unwrap().clear();

    service.move_to(&mut child, None).await?;

    let saves = recorder.saves.lock().unwrap().clone();
    assert_eq!(
        saves,
        vec![
            ("C".to_string(), CallbackScope::TopLevel),
            ("G".to_string(), CallbackScope::Cascaded),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_custom_hook_aborts_destroy_before_orphans_are_touched() -> Result<()> {
    init_tracing();
    let lifecycle = NodeLifecycle::new(Arc::new(MemoryStore::new())).with_hook(Arc::new(PinGuard));
    let service = TreeService::from_lifecycle(lifecycle, registry());

    let root = Node::new_with_id(
        "R".to_string(),
        "category".to_string(),
        "pinned".to_string(),
        serde_json::json!({}),
    );
    let root = service.create(root, None).await?;
    create(&service, "category", "C", Some(&root)).await?;

    let err = service.destroy(&root).await.unwrap_err();
    assert!(matches!(err, TreeOperationError::InvalidOperation { .. }));
    assert!(service.get("R").await?.is_some());
    assert_eq!(fetch(&service, "C").await?.path(), Some("R"));
    Ok(())
}

#[tokio::test]
async fn test_store_failure_mid_cascade_leaves_partial_rewrite() -> Result<()> {
    init_tracing();
    let store = Arc::new(FailingStore::new());
    let service = TreeService::new(store.clone(), registry());

    let root = create(&service, "category", "R", None).await?;
    let mut c1 = create(&service, "category", "C1", Some(&root)).await?;
    let g = create(&service, "category", "G", Some(&c1)).await?;
    create(&service, "category", "GG", Some(&g)).await?;
    let c2 = create(&service, "category", "C2", Some(&root)).await?;

    store.fail_saves_of("GG");
    let err = service.move_to(&mut c1, Some(&c2)).await.unwrap_err();
    assert!(matches!(err, TreeOperationError::DatabaseError(_)));

    // G was rewritten before the failure, GG and C1 were not
    assert_eq!(fetch(&service, "G").await?.path(), Some("R/C2/C1"));
    assert_eq!(fetch(&service, "GG").await?.path(), Some("R/C1/G"));
    assert_eq!(fetch(&service, "C1").await?.path(), Some("R"));
    assert!(c1.path_changed());
    Ok(())
}

#[tokio::test]
async fn test_store_failure_on_create_leaves_node_unsaved() -> Result<()> {
    init_tracing();
    let store = Arc::new(FailingStore::new());
    let service = TreeService::new(store.clone(), registry());

    store.fail_saves_of("N");
    let node = Node::new_with_id(
        "N".to_string(),
        "menu".to_string(),
        String::new(),
        serde_json::json!({}),
    );
    let err = service.create(node, None).await.unwrap_err();
    assert!(matches!(err, TreeOperationError::DatabaseError(ref msg) if msg.contains("disk full")));
    assert!(store.get_node("N").await?.is_none());
    Ok(())
}
