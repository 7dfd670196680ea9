//! Persisted policy clauses and the ordered snapshot the engine consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::effect::Effect;

/// One policy clause: a predicate type, its parameters, and the effect the
/// rule contributes when the predicate matches.
///
/// Rules belong to a subject through a storage-level back-reference
/// (`subject_type`, `subject_id`); the engine never sees those columns. It
/// only consumes the fields below, already scoped to one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Key into the evaluator registry.
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Predicate-specific parameters. `None` is equivalent to an empty map,
    /// and any non-object value is normalized to an empty map before the
    /// predicate runs.
    #[serde(default)]
    pub config: Option<Value>,
    /// Effect applied when the predicate matches.
    pub effect: Effect,
    /// Lower priorities are evaluated first; ties keep insertion order.
    #[serde(default)]
    pub priority: i32,
    /// Disabled rules are excluded from evaluation entirely.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl Rule {
    /// A rule with empty config, priority 0, enabled.
    pub fn new(rule_type: impl Into<String>, effect: Effect) -> Self {
        Self {
            rule_type: rule_type.into(),
            config: None,
            effect,
            priority: 0,
            enabled: true,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// An insertion-ordered collection of rules.
///
/// The engine never iterates a `RuleSet` directly; it consumes the
/// [`snapshot`](RuleSet::snapshot), which applies the enabled filter and the
/// priority ordering contract in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, preserving insertion order.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules, including disabled ones, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Enabled rules in ascending priority order.
    ///
    /// The sort is stable, so rules sharing a priority keep their insertion
    /// order. Disabled rules do not appear at all; they do not consume a
    /// slot in the ordering.
    pub fn snapshot(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self.rules.iter().filter(|r| r.enabled).cloned().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
