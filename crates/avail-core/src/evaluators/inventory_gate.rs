//! Threshold gate over an external inventory resolver.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

use super::{ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::inventory::{InventoryGateConfig, InventoryOutcome, ResolverAdapter, ResolverProvider};
use crate::subject::Subject;

/// Matches when the subject's inventory resolver reports availability at or
/// above `config.min`.
///
/// `min` is coerced from a number or numeric string; anything else never
/// matches. Negative thresholds clamp to 0. A missing resolver for the
/// subject's class never matches. Resolver outcomes: booleans are used
/// directly, counts are compared against `min`, anything else never
/// matches. This is the one impure evaluator: resolver failures are
/// host-owned and propagate to the caller.
#[derive(Debug)]
pub struct InventoryGateEvaluator {
    adapter: ResolverAdapter,
}

impl InventoryGateEvaluator {
    pub fn new(config: InventoryGateConfig, provider: Arc<dyn ResolverProvider>) -> Self {
        Self {
            adapter: ResolverAdapter::new(config, provider),
        }
    }
}

impl RuleEvaluator for InventoryGateEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        subject: &dyn Subject,
    ) -> Result<bool> {
        let Some(min) = threshold(config) else {
            return Ok(false);
        };
        let min = min.max(0.0);

        let Some(resolver) = self.adapter.resolver_for(subject.subject_type()) else {
            return Ok(false);
        };

        match resolver(subject, moment, config)? {
            InventoryOutcome::Bool(available) => Ok(available),
            InventoryOutcome::Count(count) => Ok(count >= min),
            InventoryOutcome::Other => Ok(false),
        }
    }

    fn is_pure(&self) -> bool {
        false
    }
}

fn threshold(config: &ConfigMap) -> Option<f64> {
    match config.get("min")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
