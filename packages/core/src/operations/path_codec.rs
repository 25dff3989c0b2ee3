//! Materialized path encoding
//!
//! A path is the ordered chain of ancestor ids, root first and immediate parent last,
//! joined with [`PATH_DELIMITER`]. Roots have no path at all.

use crate::models::Node;
use crate::operations::TreeOperationError;

/// Separator between ancestor ids in a stored path
pub const PATH_DELIMITER: char = '/';

/// Encodes, decodes and rebases materialized paths
pub struct PathCodec;

impl PathCodec {
    /// Split a stored path into ancestor ids
    ///
    /// # Examples
    /// ```
    /// # use ancestry_core::operations::PathCodec;
    /// assert!(PathCodec::decode(None).unwrap().is_empty());
    /// assert_eq!(PathCodec::decode(Some("a/b")).unwrap(), vec!["a", "b"]);
    /// assert!(PathCodec::decode(Some("a//b")).is_err());
    /// ```
    pub fn decode(path: Option<&str>) -> Result<Vec<String>, TreeOperationError> {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return Ok(Vec::new());
        };

        path.split(PATH_DELIMITER)
            .map(|segment| {
                if segment.is_empty() {
                    Err(TreeOperationError::malformed_path(path, "empty segment"))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect()
    }

    /// Join ancestor ids into a stored path; no ids means no path
    pub fn encode<S: AsRef<str>>(ids: &[S]) -> Option<String> {
        if ids.is_empty() {
            return None;
        }
        let segments: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        Some(segments.join("/"))
    }

    /// Reject ids that cannot be used as a path segment
    pub fn validate_id(id: &str) -> Result<(), TreeOperationError> {
        if id.is_empty() || id.contains(PATH_DELIMITER) {
            return Err(TreeOperationError::invalid_identifier(id));
        }
        Ok(())
    }

    /// Path the node's children carry in the store
    ///
    /// Computed from the last-persisted path, so it still locates the stored children
    /// while the node has an unsaved reparent pending.
    pub fn child_path_of(node: &Node) -> Result<String, TreeOperationError> {
        if node.is_new_record() {
            return Err(TreeOperationError::invalid_operation(format!(
                "node '{}' has never been saved and cannot have children",
                node.id
            )));
        }
        Self::extend(node.path_was(), &node.id)
    }

    /// Path the node's children will carry once its pending reparent is saved
    pub fn current_child_path_of(node: &Node) -> Result<String, TreeOperationError> {
        Self::extend(node.path(), &node.id)
    }

    fn extend(path: Option<&str>, id: &str) -> Result<String, TreeOperationError> {
        Self::validate_id(id)?;
        let mut ids = Self::decode(path)?;
        ids.push(id.to_string());
        Ok(ids.join("/"))
    }

    /// Whether `path` equals `prefix` or lies underneath it
    pub fn is_within(path: &str, prefix: &str) -> bool {
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with(PATH_DELIMITER),
            None => false,
        }
    }

    /// Move a path from `old_prefix` onto `new_prefix`, keeping the suffix
    ///
    /// Returns `None` when `path` is outside `old_prefix`. A `new_prefix` of `None`
    /// strips the prefix, so a path equal to `old_prefix` becomes a root (`Some(None)`).
    ///
    /// # Examples
    /// ```
    /// # use ancestry_core::operations::PathCodec;
    /// assert_eq!(
    ///     PathCodec::rebase("r/c1/g", "r/c1", Some("r/c2")),
    ///     Some(Some("r/c2/g".to_string()))
    /// );
    /// assert_eq!(PathCodec::rebase("r/c1", "r/c1", None), Some(None));
    /// assert_eq!(PathCodec::rebase("r/c10", "r/c1", None), None);
    /// ```
    pub fn rebase(
        path: &str,
        old_prefix: &str,
        new_prefix: Option<&str>,
    ) -> Option<Option<String>> {
        if !Self::is_within(path, old_prefix) {
            return None;
        }
        let suffix = path[old_prefix.len()..].trim_start_matches(PATH_DELIMITER);

        Some(match (new_prefix, suffix.is_empty()) {
            (Some(prefix), true) => Some(prefix.to_string()),
            (Some(prefix), false) => Some(format!("{}/{}", prefix, suffix)),
            (None, true) => None,
            (None, false) => Some(suffix.to_string()),
        })
    }
}
