//! Evaluator registry.
//!
//! Maps rule-type names to predicate instances. Definitions are accepted in
//! three shapes so the host can register eagerly (an instance),
//! declaratively (a type identifier for an injected factory), or lazily (a
//! constructor closure). Resolution happens on first lookup and the result
//! is cached, so an evaluator's internal state (like the inventory
//! adapter's per-class cache) survives across evaluations and is never
//! rebuilt per call.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::evaluators::{
    BlackoutDateEvaluator, DateRangeEvaluator, InventoryGateEvaluator, MonthsOfYearEvaluator,
    RRuleEvaluator, RuleEvaluator, TimeOfDayEvaluator, WeekdaysEvaluator,
};
use crate::inventory::{InventoryGateConfig, ResolverProvider};

/// Registry keys of the built-in evaluators.
pub mod builtin {
    pub const WEEKDAYS: &str = "weekdays";
    pub const MONTHS_OF_YEAR: &str = "months_of_year";
    pub const BLACKOUT_DATES: &str = "blackout_dates";
    pub const TIME_OF_DAY: &str = "time_of_day";
    pub const DATE_RANGE: &str = "date_range";
    pub const RRULE: &str = "rrule";
    pub const INVENTORY_GATE: &str = "inventory_gate";
}

/// Builds evaluators for declarative type identifiers.
///
/// Returning `Ok(None)` means the identifier is unknown and the rule type
/// stays unresolvable; returning `Err` signals a wiring failure that
/// propagates out of [`EvaluatorRegistry::get`].
pub trait EvaluatorFactory: Send + Sync {
    fn build(&self, type_name: &str) -> Result<Option<Arc<dyn RuleEvaluator>>>;
}

/// Constructor shape for lazily-registered evaluators.
pub type ConstructorFn = dyn Fn() -> Result<Option<Arc<dyn RuleEvaluator>>> + Send + Sync;

/// A registered definition, before resolution.
#[derive(Clone)]
pub enum EvaluatorDef {
    /// An already-constructed evaluator.
    Instance(Arc<dyn RuleEvaluator>),
    /// A type identifier, instantiated by the injected factory.
    TypeName(String),
    /// A constructor closure, invoked on first lookup.
    Constructor(Arc<ConstructorFn>),
}

impl EvaluatorDef {
    /// Wrap a constructor closure as a definition.
    pub fn constructor<F>(f: F) -> Self
    where
        F: Fn() -> Result<Option<Arc<dyn RuleEvaluator>>> + Send + Sync + 'static,
    {
        EvaluatorDef::Constructor(Arc::new(f))
    }
}

impl fmt::Debug for EvaluatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorDef::Instance(_) => f.write_str("Instance(..)"),
            EvaluatorDef::TypeName(name) => f.debug_tuple("TypeName").field(name).finish(),
            EvaluatorDef::Constructor(_) => f.write_str("Constructor(..)"),
        }
    }
}

/// Rule-type name to evaluator mapping with lazy construction and
/// single-instance caching.
pub struct EvaluatorRegistry {
    definitions: HashMap<String, EvaluatorDef>,
    resolved: RwLock<HashMap<String, Arc<dyn RuleEvaluator>>>,
    factory: Option<Arc<dyn EvaluatorFactory>>,
}

impl EvaluatorRegistry {
    /// An empty registry without a factory; only `Instance` and
    /// `Constructor` definitions can resolve.
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            resolved: RwLock::new(HashMap::new()),
            factory: None,
        }
    }

    /// An empty registry that resolves `TypeName` definitions through the
    /// given factory.
    pub fn with_factory(factory: Arc<dyn EvaluatorFactory>) -> Self {
        Self {
            definitions: HashMap::new(),
            resolved: RwLock::new(HashMap::new()),
            factory: Some(factory),
        }
    }

    /// A registry preloaded with the seven built-in evaluators under their
    /// [`builtin`] names.
    pub fn with_builtins(
        inventory: InventoryGateConfig,
        provider: Arc<dyn ResolverProvider>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            builtin::WEEKDAYS,
            EvaluatorDef::Instance(Arc::new(WeekdaysEvaluator)),
        );
        registry.register(
            builtin::MONTHS_OF_YEAR,
            EvaluatorDef::Instance(Arc::new(MonthsOfYearEvaluator)),
        );
        registry.register(
            builtin::BLACKOUT_DATES,
            EvaluatorDef::Instance(Arc::new(BlackoutDateEvaluator)),
        );
        registry.register(
            builtin::TIME_OF_DAY,
            EvaluatorDef::Instance(Arc::new(TimeOfDayEvaluator)),
        );
        registry.register(
            builtin::DATE_RANGE,
            EvaluatorDef::Instance(Arc::new(DateRangeEvaluator)),
        );
        registry.register(
            builtin::RRULE,
            EvaluatorDef::Instance(Arc::new(RRuleEvaluator)),
        );
        registry.register(
            builtin::INVENTORY_GATE,
            EvaluatorDef::Instance(Arc::new(InventoryGateEvaluator::new(inventory, provider))),
        );
        registry
    }

    /// Install the factory that resolves `TypeName` definitions. Clears the
    /// resolved cache so previously-unresolvable types get another chance.
    pub fn set_factory(&mut self, factory: Arc<dyn EvaluatorFactory>) {
        self.resolved
            .write()
            .expect("resolved cache lock poisoned")
            .clear();
        self.factory = Some(factory);
    }

    /// Install or replace a definition. Replacing invalidates only that
    /// type's cache entry; other resolved evaluators keep their state.
    pub fn register(&mut self, rule_type: impl Into<String>, def: EvaluatorDef) {
        let rule_type = rule_type.into();
        self.resolved
            .write()
            .expect("resolved cache lock poisoned")
            .remove(&rule_type);
        debug!(rule_type = %rule_type, def = ?def, "registered evaluator definition");
        self.definitions.insert(rule_type, def);
    }

    /// Install every `rule_types` entry from a configuration block as a
    /// `TypeName` definition.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        for (rule_type, type_name) in &config.rule_types {
            self.register(
                rule_type.clone(),
                EvaluatorDef::TypeName(type_name.clone()),
            );
        }
    }

    /// The evaluator for a rule type.
    ///
    /// Resolves and caches on first lookup. `Ok(None)` when no definition
    /// exists, when a `TypeName` definition has no factory or an identifier
    /// the factory does not know, or when a constructor produces nothing.
    /// Factory and constructor failures propagate.
    pub fn get(&self, rule_type: &str) -> Result<Option<Arc<dyn RuleEvaluator>>> {
        if let Some(hit) = self
            .resolved
            .read()
            .expect("resolved cache lock poisoned")
            .get(rule_type)
        {
            return Ok(Some(hit.clone()));
        }

        let Some(def) = self.definitions.get(rule_type) else {
            return Ok(None);
        };
        let evaluator = match def {
            EvaluatorDef::Instance(instance) => Some(instance.clone()),
            EvaluatorDef::TypeName(type_name) => match &self.factory {
                Some(factory) => factory.build(type_name)?,
                None => None,
            },
            EvaluatorDef::Constructor(constructor) => constructor()?,
        };

        if let Some(evaluator) = &evaluator {
            self.resolved
                .write()
                .expect("resolved cache lock poisoned")
                .insert(rule_type.to_string(), evaluator.clone());
        }
        Ok(evaluator)
    }

    /// Resolve every definition, skipping those that resolve to nothing,
    /// and return the cache contents. Construction failures propagate.
    pub fn all(&self) -> Result<HashMap<String, Arc<dyn RuleEvaluator>>> {
        for rule_type in self.definitions.keys() {
            self.get(rule_type)?;
        }
        Ok(self
            .resolved
            .read()
            .expect("resolved cache lock poisoned")
            .clone())
    }

    /// Whether a definition (resolved or not) exists for a rule type.
    pub fn contains(&self, rule_type: &str) -> bool {
        self.definitions.contains_key(rule_type)
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorRegistry")
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}
