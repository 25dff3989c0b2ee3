//! Tree Behavior Configuration
//!
//! Per-type tree configuration, resolved by node type:
//!
//! - `OrphanStrategy` - What happens to descendants when a node is destroyed
//! - `TreeConfig` - The three knobs a node type can set
//! - `TreeConfigRegistry` - Immutable type → config lookup built once at composition time
//!
//! Only types registered here are handled by the tree lifecycle hooks. Looking up an
//! unregistered type yields `TreeConfig::default()`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy applied to a destroyed node's descendants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanStrategy {
    /// All descendants are destroyed as well
    #[default]
    Destroy,
    /// Children of the destroyed node become roots
    Rootify,
    /// Destroying a node that still has children fails
    Restrict,
}

/// Tree configuration for a single node type
///
/// # Examples
///
/// ```rust
/// use ancestry_core::behaviors::{OrphanStrategy, TreeConfig};
///
/// let config = TreeConfig::default();
/// assert_eq!(config.orphan_strategy, OrphanStrategy::Destroy);
/// assert!(!config.ordering_enabled);
/// assert!(!config.cache_depth);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    /// What to do with descendants on destroy
    pub orphan_strategy: OrphanStrategy,
    /// Maintain dense sibling positions
    pub ordering_enabled: bool,
    /// Write the node's depth on every save
    pub cache_depth: bool,
}

impl TreeConfig {
    /// Config with the given orphan strategy and everything else defaulted
    pub fn with_orphan_strategy(orphan_strategy: OrphanStrategy) -> Self {
        Self {
            orphan_strategy,
            ..Default::default()
        }
    }

    /// Enable sibling ordering
    pub fn ordered(mut self) -> Self {
        self.ordering_enabled = true;
        self
    }

    /// Enable depth caching
    pub fn caching_depth(mut self) -> Self {
        self.cache_depth = true;
        self
    }
}

/// Registry of tree-enabled node types
///
/// # Examples
///
/// ```rust
/// use ancestry_core::behaviors::{OrphanStrategy, TreeConfig, TreeConfigRegistry};
///
/// let registry = TreeConfigRegistry::new()
///     .register("category", TreeConfig::with_orphan_strategy(OrphanStrategy::Rootify).ordered());
///
/// assert!(registry.is_tree_enabled("category"));
/// assert!(registry.resolve("category").ordering_enabled);
/// assert_eq!(registry.resolve("unknown"), TreeConfig::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeConfigRegistry {
    configs: HashMap<String, TreeConfig>,
}

impl TreeConfigRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the config for a node type
    pub fn register(mut self, node_type: impl Into<String>, config: TreeConfig) -> Self {
        self.configs.insert(node_type.into(), config);
        self
    }

    /// Build a registry from a JSON object mapping node types to configs
    ///
    /// ```rust
    /// use ancestry_core::behaviors::{OrphanStrategy, TreeConfigRegistry};
    /// use serde_json::json;
    ///
    /// let registry = TreeConfigRegistry::from_json(json!({
    ///     "category": { "orphanStrategy": "restrict", "orderingEnabled": true }
    /// }))
    /// .unwrap();
    /// assert_eq!(registry.resolve("category").orphan_strategy, OrphanStrategy::Restrict);
    /// ```
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let configs: HashMap<String, TreeConfig> = serde_json::from_value(value)?;
        Ok(Self { configs })
    }

    /// Whether the lifecycle hooks should handle this node type
    pub fn is_tree_enabled(&self, node_type: &str) -> bool {
        self.configs.contains_key(node_type)
    }

    /// Config for a registered type, if any
    pub fn get(&self, node_type: &str) -> Option<TreeConfig> {
        self.configs.get(node_type).copied()
    }

    /// Config for a type, defaulting to `{Destroy, false, false}` when unconfigured
    pub fn resolve(&self, node_type: &str) -> TreeConfig {
        self.get(node_type).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = TreeConfig::default();
        assert_eq!(config.orphan_strategy, OrphanStrategy::Destroy);
        assert!(!config.ordering_enabled);
        assert!(!config.cache_depth);
    }

    #[test]
    fn test_registry_resolves_registered_types() {
        let registry = TreeConfigRegistry::new()
            .register("menu", TreeConfig::default().ordered().caching_depth())
            .register(
                "folder",
                TreeConfig::with_orphan_strategy(OrphanStrategy::Restrict),
            );

        let menu = registry.resolve("menu");
        assert!(menu.ordering_enabled);
        assert!(menu.cache_depth);
        assert_eq!(
            registry.resolve("folder").orphan_strategy,
            OrphanStrategy::Restrict
        );
        assert!(registry.get("page").is_none());
        assert!(!registry.is_tree_enabled("page"));
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let registry = TreeConfigRegistry::from_json(json!({
            "menu": { "cacheDepth": true },
            "folder": {}
        }))
        .unwrap();

        assert!(registry.resolve("menu").cache_depth);
        assert_eq!(registry.resolve("folder"), TreeConfig::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_strategy() {
        let result = TreeConfigRegistry::from_json(json!({
            "menu": { "orphanStrategy": "nullify" }
        }));
        assert!(result.is_err());
    }
}
