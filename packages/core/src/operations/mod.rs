//! Tree Operations
//!
//! The algorithms that keep a flat collection indexed as a tree:
//!
//! - `PathCodec` - Path encoding, child paths and prefix rebasing
//! - `TreeIndex` - Ancestor/child/sibling/descendant queries and the reparent cascade
//! - `OrderingIndex` - Dense sibling positions and move operations
//! - `OrphanResolver` - Destroy / Rootify / Restrict handling of descendants
//!
//! Writes issued by these operations always go through `NodeLifecycle` so that other
//! hooks observe them.

pub mod error;
pub mod ordering;
pub mod orphans;
pub mod path_codec;
pub mod tree_index;

pub use error::TreeOperationError;
pub use ordering::{OrderingIndex, Placement};
pub use orphans::OrphanResolver;
pub use path_codec::{PathCodec, PATH_DELIMITER};
pub use tree_index::TreeIndex;
