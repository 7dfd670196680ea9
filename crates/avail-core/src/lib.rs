//! # avail-core
//!
//! Deterministic point-in-time availability decisions from ordered
//! allow/deny rules.
//!
//! A *subject* (anything with an attached availability policy) carries a
//! set of persisted rules. Each rule names a predicate type, parameters for
//! it, an allow/deny effect, and a priority. Asking "is this subject
//! available at this moment?" folds the enabled rules in ascending priority
//! order: every rule whose predicate matches the subject-local moment
//! replaces the running effect, so the last match wins. With no matching
//! rules the subject's default effect answers.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use avail_core::inventory::{InventoryGateConfig, NullProvider};
//! use avail_core::{AvailabilityEngine, Effect, EvaluatorRegistry, Rule, SubjectProfile};
//! use chrono::{TimeZone, Utc};
//! use serde_json::json;
//!
//! let registry =
//!     EvaluatorRegistry::with_builtins(InventoryGateConfig::default(), Arc::new(NullProvider));
//! let engine = AvailabilityEngine::new(registry).with_default_effect(Effect::Deny);
//!
//! let subject = SubjectProfile::new("Listing")
//!     .with_timezone("America/New_York")
//!     .with_rule(
//!         Rule::new("weekdays", Effect::Allow)
//!             .with_config(json!({ "days": [1, 2, 3, 4, 5] }))
//!             .with_priority(10),
//!     );
//!
//! // Wednesday noon in New York (17:00 UTC).
//! let moment = Utc.with_ymd_and_hms(2025, 6, 4, 17, 0, 0).unwrap();
//! assert!(engine.is_available(&subject, moment).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`engine`] -- the evaluation pipeline (`is_available`, last match wins)
//! - [`evaluators`] -- the seven built-in temporal predicates
//! - [`registry`] -- rule-type name to evaluator mapping with lazy construction
//! - [`inventory`] -- resolver adapter for the one impure predicate
//! - [`rule`] / [`subject`] / [`effect`] -- the contracts the engine consumes
//! - [`config`] -- the construction-time configuration block
//! - [`error`] -- error types

pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod inventory;
pub mod registry;
pub mod rule;
pub mod subject;

pub use config::EngineConfig;
pub use effect::Effect;
pub use engine::{AvailabilityEngine, EvaluationTrace, RuleStep, StepOutcome};
pub use error::{AvailError, Result};
pub use evaluators::{ConfigMap, RuleEvaluator};
pub use registry::{EvaluatorDef, EvaluatorFactory, EvaluatorRegistry};
pub use rule::{Rule, RuleSet};
pub use subject::{Subject, SubjectProfile};
