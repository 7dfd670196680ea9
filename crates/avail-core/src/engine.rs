//! The availability engine.
//!
//! Folds a subject's enabled rules, in ascending priority order, into a
//! point-in-time allow/deny verdict. Last match wins: callers layer broad
//! allow/deny bands at low priority and narrow overrides at high priority.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::effect::Effect;
use crate::error::{AvailError, Result};
use crate::evaluators::ConfigMap;
use crate::inventory::ResolverProvider;
use crate::registry::EvaluatorRegistry;
use crate::subject::Subject;

/// Why a rule did or did not change the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Matched,
    NotMatched,
    /// The rule's type had no definition, or its definition resolved to
    /// nothing. The rule is inert.
    SkippedUnknownType,
}

/// One rule's contribution to an evaluation.
#[derive(Debug, Clone)]
pub struct RuleStep {
    pub rule_type: String,
    pub priority: i32,
    pub effect: Effect,
    pub outcome: StepOutcome,
    /// The running state after this rule was visited.
    pub state_after: bool,
}

/// A full evaluation transcript, as produced by
/// [`AvailabilityEngine::trace`].
#[derive(Debug, Clone)]
pub struct EvaluationTrace {
    /// The zone the moment was localized to.
    pub timezone: Tz,
    /// The state before any rule ran: the subject's default effect, or the
    /// engine's fallback.
    pub initial: bool,
    /// The final answer.
    pub verdict: bool,
    /// Per-rule outcomes in visit order.
    pub steps: Vec<RuleStep>,
}

/// The rule evaluation pipeline.
///
/// Long-lived; typically constructed once at startup and shared. Holds the
/// evaluator registry, the fallback effect for subjects without an explicit
/// default, and the default timezone used when a subject declares none.
#[derive(Debug)]
pub struct AvailabilityEngine {
    registry: EvaluatorRegistry,
    default_effect: Effect,
    default_tz: Tz,
}

impl AvailabilityEngine {
    /// An engine over an existing registry, defaulting to `Allow` and UTC.
    pub fn new(registry: EvaluatorRegistry) -> Self {
        Self {
            registry,
            default_effect: Effect::Allow,
            default_tz: Tz::UTC,
        }
    }

    /// An engine wired from a configuration block: built-in evaluators,
    /// the configured inventory resolvers, the configured `rule_types`
    /// installed as declarative definitions, and the configured default
    /// effect. Hosts using `rule_types` must also install a factory via
    /// [`EvaluatorRegistry::set_factory`] on [`registry_mut`].
    ///
    /// [`registry_mut`]: AvailabilityEngine::registry_mut
    pub fn from_config(config: &EngineConfig, provider: std::sync::Arc<dyn ResolverProvider>) -> Self {
        let mut registry =
            EvaluatorRegistry::with_builtins(config.inventory_gate.clone(), provider);
        registry.apply_config(config);
        Self {
            registry,
            default_effect: config.default_effect,
            default_tz: Tz::UTC,
        }
    }

    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = effect;
        self
    }

    /// The zone used when a subject has no timezone of its own. This is the
    /// explicit stand-in for a process-default zone; it defaults to UTC.
    pub fn with_default_timezone(mut self, tz: Tz) -> Self {
        self.default_tz = tz;
        self
    }

    pub fn registry(&self) -> &EvaluatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EvaluatorRegistry {
        &mut self.registry
    }

    /// Is the subject available at this moment?
    ///
    /// # Errors
    ///
    /// Fails when the subject declares a timezone that is not a valid IANA
    /// name, when an evaluator definition fails to construct, or when an
    /// inventory resolver fails. Malformed rule configs never fail; those
    /// rules simply do not match.
    pub fn is_available(&self, subject: &dyn Subject, moment: DateTime<Utc>) -> Result<bool> {
        Ok(self.trace(subject, moment)?.verdict)
    }

    /// Evaluate like [`is_available`](AvailabilityEngine::is_available) but
    /// record every rule's outcome. The CLI's `explain` view and tests use
    /// this; hosts can surface it for rule debugging.
    pub fn trace(&self, subject: &dyn Subject, moment: DateTime<Utc>) -> Result<EvaluationTrace> {
        let tz = self.subject_zone(subject)?;
        // Same instant, displayed in the subject's zone. The caller's
        // moment is untouched.
        let local = moment.with_timezone(&tz);

        let mut state = subject
            .default_effect()
            .unwrap_or(self.default_effect)
            .allows();
        let initial = state;
        let mut steps = Vec::new();

        for rule in subject.availability_rules() {
            let outcome = match self.registry.get(&rule.rule_type)? {
                None => {
                    debug!(rule_type = %rule.rule_type, "skipping rule with unresolvable evaluator");
                    StepOutcome::SkippedUnknownType
                }
                Some(evaluator) => {
                    let config = normalized_config(rule.config.as_ref());
                    if evaluator.matches(&config, &local, subject)? {
                        state = rule.effect.allows();
                        StepOutcome::Matched
                    } else {
                        StepOutcome::NotMatched
                    }
                }
            };
            trace!(rule_type = %rule.rule_type, ?outcome, state, "visited rule");
            steps.push(RuleStep {
                rule_type: rule.rule_type.clone(),
                priority: rule.priority,
                effect: rule.effect,
                outcome,
                state_after: state,
            });
        }

        debug!(
            subject_type = subject.subject_type(),
            verdict = state,
            "availability decided"
        );
        Ok(EvaluationTrace {
            timezone: tz,
            initial,
            verdict: state,
            steps,
        })
    }

    fn subject_zone(&self, subject: &dyn Subject) -> Result<Tz> {
        match subject.timezone() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| AvailError::InvalidTimezone(name)),
            None => Ok(self.default_tz),
        }
    }
}

/// Non-mapping stored configs (including null) normalize to the empty map
/// before the evaluator sees them.
fn normalized_config(config: Option<&Value>) -> ConfigMap {
    match config {
        Some(Value::Object(map)) => map.clone(),
        _ => ConfigMap::new(),
    }
}
