//! Engine configuration.
//!
//! An explicit construction-time input, never process-global state; tests
//! and hosts each build their own. Unknown keys in the source document are
//! ignored.

use std::collections::HashMap;

use serde::Deserialize;

use crate::effect::Effect;
use crate::inventory::InventoryGateConfig;

/// The recognized configuration block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the storage location for rules. Consumed by the host's
    /// persistence layer; the engine itself never touches storage.
    pub table: String,
    /// Fallback effect for subjects without an explicit default.
    pub default_effect: Effect,
    /// Rule-type name to evaluator type identifier, installed into the
    /// registry at startup through the injected factory.
    pub rule_types: HashMap<String, String>,
    /// Inventory resolver definitions for the `inventory_gate` evaluator.
    pub inventory_gate: InventoryGateConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table: "availability_rules".to_string(),
            default_effect: Effect::Allow,
            rule_types: HashMap::new(),
            inventory_gate: InventoryGateConfig::default(),
        }
    }
}
