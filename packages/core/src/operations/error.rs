//! Error types for tree operations
//!
//! Every tree operation fails fast with a `TreeOperationError`. The error propagates to
//! the save or destroy call that triggered it, which is aborted before the node's own
//! row is written or removed.

use thiserror::Error;

/// Errors that can occur during tree operations
///
/// # Examples
///
/// ```rust
/// use ancestry_core::operations::TreeOperationError;
///
/// let err = TreeOperationError::restricted_deletion("folder-1".to_string(), 2);
/// assert!(err.to_string().contains("folder-1"));
///
/// let err = TreeOperationError::circular_reference("a".to_string(), "b".to_string());
/// assert!(matches!(err, TreeOperationError::CircularReference { .. }));
/// ```
#[derive(Error, Debug)]
pub enum TreeOperationError {
    /// The requested operation is not allowed in the node's current state
    ///
    /// Raised for the child path of an unsaved node, ordering moves on a type without
    /// ordering, or a parent of a different node type.
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// Destroy refused because the node still has children (Restrict strategy)
    #[error("Cannot delete node '{node_id}': it has {child_count} child node(s)")]
    RestrictedDeletion { node_id: String, child_count: usize },

    /// A stored path references an ancestor that no longer exists
    #[error("Consistency violation: node '{node_id}' references missing ancestor '{missing_id}'")]
    ConsistencyViolation { node_id: String, missing_id: String },

    /// The requested parent is the node itself or one of its descendants
    #[error("Circular reference: node '{node_id}' cannot be placed under '{parent_id}'")]
    CircularReference { node_id: String, parent_id: String },

    /// A stored path could not be decoded
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// The identifier cannot be used as a path segment
    #[error("Invalid identifier '{id}': identifiers must be non-empty and must not contain '/'")]
    InvalidIdentifier { id: String },

    /// Referenced node does not exist
    #[error("Node '{node_id}' does not exist")]
    NodeNotFound { node_id: String },

    /// Store operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl TreeOperationError {
    /// Create an InvalidOperation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Create a RestrictedDeletion error
    pub fn restricted_deletion(node_id: String, child_count: usize) -> Self {
        Self::RestrictedDeletion {
            node_id,
            child_count,
        }
    }

    /// Create a ConsistencyViolation error
    pub fn consistency_violation(node_id: String, missing_id: String) -> Self {
        Self::ConsistencyViolation {
            node_id,
            missing_id,
        }
    }

    /// Create a CircularReference error
    pub fn circular_reference(node_id: String, parent_id: String) -> Self {
        Self::CircularReference { node_id, parent_id }
    }

    /// Create a MalformedPath error
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidIdentifier error
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    /// Create a NodeNotFound error
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create a DatabaseError
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError(message.into())
    }
}

// anyhow::Error does not implement std::error::Error, so no #[from]
impl From<anyhow::Error> for TreeOperationError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(format!("{:#}", err))
    }
}
