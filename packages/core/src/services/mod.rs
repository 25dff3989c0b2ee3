//! Services
//!
//! This module drives writes and binds the tree operations into them:
//!
//! - `NodeLifecycle` - Save/destroy driver with registrable `LifecycleHook`s
//! - `TreeCoordinator` - The hook that keeps paths, positions and orphans consistent
//! - `TreeService` - Façade bundling a lifecycle, the coordinator and the tree queries

pub mod lifecycle;
pub mod tree_coordinator;
pub mod tree_service;

pub use lifecycle::{CallbackScope, LifecycleHook, NodeLifecycle};
pub use tree_coordinator::TreeCoordinator;
pub use tree_service::TreeService;
