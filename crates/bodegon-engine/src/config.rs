//! # Engine Configuration
//!
//! Static configuration handed to the engine at construction. All
//! fields are read-only after initialization.

use bodegon_core::types::DEFAULT_SUBTYPE;

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Operator name stamped into `created_by` on new orders.
    pub operator: String,

    /// Key under which the order list is mirrored in the order store.
    pub store_key: String,

    /// Maximum retained inventory-commit reports.
    pub history_cap: usize,

    /// Enables the administrative `replace_all_orders` API. Off in
    /// production; on for test-data injection tooling.
    pub dev_tools: bool,

    /// Subtypes assumed when the catalog backend defines none.
    pub default_subtypes: Vec<String>,
}

impl EngineConfig {
    /// Returns a config with the given operator and defaults elsewhere.
    pub fn for_operator(operator: impl Into<String>) -> Self {
        EngineConfig {
            operator: operator.into(),
            ..EngineConfig::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            operator: "Desconocido".to_string(),
            store_key: "pendingOrders".to_string(),
            history_cap: 50,
            dev_tools: false,
            default_subtypes: vec![
                DEFAULT_SUBTYPE.to_string(),
                "Botella Tercio".to_string(),
                "Lata Pequeña".to_string(),
                "Lata Grande".to_string(),
            ],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.store_key, "pendingOrders");
        assert_eq!(config.history_cap, 50);
        assert!(!config.dev_tools);
        assert_eq!(config.default_subtypes.len(), 4);
    }

    #[test]
    fn test_for_operator() {
        let config = EngineConfig::for_operator("YESSI");
        assert_eq!(config.operator, "YESSI");
        assert_eq!(config.history_cap, 50);
    }
}
