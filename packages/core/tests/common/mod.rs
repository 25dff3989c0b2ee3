//! Shared helpers for the integration tests

#![allow(dead_code)]

use ancestry_core::behaviors::{OrphanStrategy, TreeConfig, TreeConfigRegistry};
use ancestry_core::db::{MemoryStore, NodeStore, TursoStore};
use ancestry_core::models::Node;
use ancestry_core::services::TreeService;
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry used across the suites
///
/// - `category`: destroy strategy, unordered
/// - `menu`: ordered, depth cached
/// - `folder`: restrict strategy
/// - `outline`: rootify strategy, ordered
pub fn registry() -> TreeConfigRegistry {
    TreeConfigRegistry::new()
        .register("category", TreeConfig::default())
        .register("menu", TreeConfig::default().ordered().caching_depth())
        .register(
            "folder",
            TreeConfig::with_orphan_strategy(OrphanStrategy::Restrict),
        )
        .register(
            "outline",
            TreeConfig::with_orphan_strategy(OrphanStrategy::Rootify).ordered(),
        )
}

pub fn memory_service() -> (TreeService, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    (TreeService::new(store.clone(), registry()), store)
}

/// Service over a libsql database in a temp dir; keep the `TempDir` alive
pub async fn turso_service() -> Result<(TreeService, TempDir)> {
    init_tracing();
    let temp_dir = TempDir::new()?;
    let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(temp_dir.path().join("tree.db")).await?);
    Ok((TreeService::new(store, registry()), temp_dir))
}

/// Create and save a node with a readable id
pub async fn create(
    service: &TreeService,
    node_type: &str,
    id: &str,
    parent: Option<&Node>,
) -> Result<Node> {
    let node = Node::new_with_id(id.to_string(), node_type.to_string(), id.to_string(), json!({}));
    Ok(service.create(node, parent).await?)
}

/// Fetch a node that must exist
pub async fn fetch(service: &TreeService, id: &str) -> Result<Node> {
    Ok(service.require(id).await?)
}

pub fn ids(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.id.clone()).collect()
}

/// `(id, position)` of a node's children in sibling order
pub async fn child_layout(service: &TreeService, parent: &Node) -> Result<Vec<(String, i64)>> {
    Ok(service
        .tree()
        .children(parent)
        .await?
        .into_iter()
        .map(|n| (n.id.clone(), n.position().unwrap_or(-1)))
        .collect())
}

pub fn layout(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items.iter().map(|(id, p)| (id.to_string(), *p)).collect()
}
