//! The minimal contract the engine requires from an evaluated entity.

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::rule::{Rule, RuleSet};

/// Anything availability can be decided for.
///
/// Hosts with their own persistence implement this directly over their
/// models; [`SubjectProfile`] is the self-contained implementation used by
/// the CLI and by tests.
pub trait Subject {
    /// Class identity, e.g. `"Listing"`. Used to select inventory resolvers
    /// and as the memoization key for the resolver adapter.
    fn subject_type(&self) -> &str;

    /// Enabled rules in ascending priority order, stable with respect to
    /// insertion order for equal priorities. Implementations backed by a
    /// [`RuleSet`] get this contract from [`RuleSet::snapshot`].
    fn availability_rules(&self) -> Vec<Rule>;

    /// Subject-specific default effect. `None` falls back to the engine's
    /// configured default.
    fn default_effect(&self) -> Option<Effect>;

    /// IANA timezone name. `None` falls back to the engine's default zone.
    fn timezone(&self) -> Option<String>;
}

/// Self-contained subject backed by an in-memory rule set.
///
/// Deserializes from the profile document the CLI consumes:
///
/// ```json
/// {
///   "subject_type": "Listing",
///   "timezone": "America/New_York",
///   "default_effect": "deny",
///   "rules": [{ "type": "weekdays", "effect": "allow", "config": { "days": [1, 2, 3, 4, 5] } }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub subject_type: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub default_effect: Option<Effect>,
    #[serde(default)]
    pub rules: RuleSet,
}

impl SubjectProfile {
    pub fn new(subject_type: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            timezone: None,
            default_effect: None,
            rules: RuleSet::new(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = Some(effect);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Subject for SubjectProfile {
    fn subject_type(&self) -> &str {
        &self.subject_type
    }

    fn availability_rules(&self) -> Vec<Rule> {
        self.rules.snapshot()
    }

    fn default_effect(&self) -> Option<Effect> {
        self.default_effect
    }

    fn timezone(&self) -> Option<String> {
        self.timezone.clone()
    }
}
