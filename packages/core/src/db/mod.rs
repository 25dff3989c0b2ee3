//! Database Layer
//!
//! The flat record store the tree index is layered over:
//!
//! - `NodeStore` - Async trait every backend implements
//! - `MemoryStore` - In-process backend (tokio `RwLock` around a map)
//! - `TursoStore` - Embedded libsql backend (feature `turso`, on by default)
//!
//! The tree index never relies on recursive queries; everything it asks of a store is
//! expressible as a `NodeQuery`.

#[cfg(feature = "turso")]
mod error;
mod memory_store;
mod node_store;
#[cfg(feature = "turso")]
mod turso_store;

#[cfg(feature = "turso")]
pub use error::StoreOpenError;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
#[cfg(feature = "turso")]
pub use turso_store::TursoStore;
