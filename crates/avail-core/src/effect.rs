//! The two-valued verdict a matching rule contributes.

use serde::{Deserialize, Serialize};

/// Allow/deny verdict attached to every rule and to a subject's default.
///
/// Serializes as lowercase `"allow"` / `"deny"` to match the persisted
/// rule layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    /// True iff the effect is [`Effect::Allow`].
    pub fn allows(self) -> bool {
        matches!(self, Effect::Allow)
    }
}
