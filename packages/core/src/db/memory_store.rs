//! MemoryStore - In-process NodeStore
//!
//! Keeps every node in a `HashMap` behind a tokio `RwLock`. Each node records the
//! sequence number of its first save, which gives `OrderBy::Insertion` a stable order
//! that survives later updates.

use crate::db::node_store::NodeStore;
use crate::models::{DeleteResult, Node, NodeQuery, OrderBy};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    next_seq: u64,
    rows: HashMap<String, (u64, Node)>,
}

/// In-memory `NodeStore` used by tests, benchmarks and embedders without a database
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes across all types
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Whether the store holds no nodes
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.rows.is_empty()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let state = self.state.read().await;
        Ok(state.rows.get(id).map(|(_, node)| {
            let mut node = node.clone();
            node.mark_loaded();
            node
        }))
    }

    async fn query_nodes(&self, query: NodeQuery) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut matches: Vec<&(u64, Node)> = state
            .rows
            .values()
            .filter(|(_, node)| query.filter.matches(node))
            .collect();

        match query.order_by {
            OrderBy::Insertion => matches.sort_by_key(|(seq, _)| *seq),
            OrderBy::Position => matches.sort_by_key(|(seq, node)| {
                (node.position().is_none(), node.position(), *seq)
            }),
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|(_, node)| {
                let mut node = node.clone();
                node.mark_loaded();
                node
            })
            .collect())
    }

    async fn save_node(&self, node: &Node) -> Result<()> {
        let mut state = self.state.write().await;
        let existing = state.rows.get(&node.id).map(|(seq, _)| *seq);
        let seq = match existing {
            Some(seq) => seq,
            None => {
                state.next_seq += 1;
                state.next_seq
            }
        };
        state.rows.insert(node.id.clone(), (seq, node.clone()));
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<DeleteResult> {
        let mut state = self.state.write().await;
        Ok(match state.rows.remove(id) {
            Some(_) => DeleteResult::existed(),
            None => DeleteResult::not_found(),
        })
    }

    async fn count_nodes(&self, query: NodeQuery) -> Result<usize> {
        let state = self.state.read().await;
        let count = state
            .rows
            .values()
            .filter(|(_, node)| query.filter.matches(node))
            .count();
        Ok(query.limit.map_or(count, |limit| count.min(limit)))
    }
}
