//! Inventory resolver adapter.
//!
//! Resolver definitions arrive from untyped configuration or programmatic
//! registration in several shapes. This module normalizes whichever shape
//! was selected for a subject class into a single uniform callable, and
//! memoizes the outcome per class name for the lifetime of the predicate.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::evaluators::ConfigMap;
use crate::subject::Subject;

/// What an inventory resolver reported for a subject at a moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InventoryOutcome {
    /// A direct availability verdict.
    Bool(bool),
    /// A stock count, compared against the rule's `min` threshold.
    Count(f64),
    /// Anything the gate cannot interpret; never matches.
    Other,
}

/// The uniform callable every resolver definition normalizes to.
pub type ResolverFn =
    dyn Fn(&dyn Subject, &DateTime<Tz>, &ConfigMap) -> Result<InventoryOutcome> + Send + Sync;

/// A host service that can answer inventory queries.
///
/// `resolve` is the default entry point; `call` handles `service@method`
/// definitions. The default `call` only knows `"resolve"` and answers any
/// other method with [`InventoryOutcome::Other`], so a misconfigured method
/// name degrades to a non-match instead of failing.
pub trait InventoryService: Send + Sync {
    fn resolve(
        &self,
        subject: &dyn Subject,
        moment: &DateTime<Tz>,
        config: &ConfigMap,
    ) -> Result<InventoryOutcome>;

    fn call(
        &self,
        method: &str,
        subject: &dyn Subject,
        moment: &DateTime<Tz>,
        config: &ConfigMap,
    ) -> Result<InventoryOutcome> {
        if method == "resolve" {
            self.resolve(subject, moment, config)
        } else {
            Ok(InventoryOutcome::Other)
        }
    }
}

/// Instantiates named resolver services for string definitions.
///
/// The host injects one of these so configuration can reference services
/// declaratively (`"warehouse"` or `"warehouse@count_for"`).
pub trait ResolverProvider: Send + Sync {
    fn instantiate(&self, name: &str) -> Option<Arc<dyn InventoryService>>;
}

/// Provider for hosts without named resolver services; every lookup yields
/// `None`, so only `Callable` and `Service` definitions can resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl ResolverProvider for NullProvider {
    fn instantiate(&self, _name: &str) -> Option<Arc<dyn InventoryService>> {
        None
    }
}

/// One resolver definition, in any of the accepted shapes.
#[derive(Clone)]
pub enum ResolverDef {
    /// A closure registered programmatically; used as-is.
    Callable(Arc<ResolverFn>),
    /// `"service"` or `"service@method"` from configuration, instantiated
    /// through the provider. Without `@` the `resolve` method is bound.
    Named(String),
    /// `["service", "method"]` from configuration.
    Pair(String, String),
    /// A pre-built service instance plus the method to bind.
    Service(Arc<dyn InventoryService>, String),
    /// Any unrecognized configuration shape; normalizes to no resolver.
    Invalid,
}

impl ResolverDef {
    /// Wrap a closure as a definition.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&dyn Subject, &DateTime<Tz>, &ConfigMap) -> Result<InventoryOutcome>
            + Send
            + Sync
            + 'static,
    {
        ResolverDef::Callable(Arc::new(f))
    }

    /// Parse a definition out of untyped configuration. Strings become
    /// [`ResolverDef::Named`]; two-element string arrays become
    /// [`ResolverDef::Pair`]; anything else is [`ResolverDef::Invalid`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if !s.is_empty() => ResolverDef::Named(s.clone()),
            Value::Array(items) if items.len() == 2 => {
                match (items[0].as_str(), items[1].as_str()) {
                    (Some(service), Some(method)) if !service.is_empty() && !method.is_empty() => {
                        ResolverDef::Pair(service.to_string(), method.to_string())
                    }
                    _ => ResolverDef::Invalid,
                }
            }
            _ => ResolverDef::Invalid,
        }
    }
}

impl fmt::Debug for ResolverDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverDef::Callable(_) => f.write_str("Callable(..)"),
            ResolverDef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ResolverDef::Pair(service, method) => {
                f.debug_tuple("Pair").field(service).field(method).finish()
            }
            ResolverDef::Service(_, method) => {
                f.debug_tuple("Service").field(&"..").field(method).finish()
            }
            ResolverDef::Invalid => f.write_str("Invalid"),
        }
    }
}

/// The `inventory_gate` configuration block:
/// `{ "resolver": <def>?, "resolvers": { "<class>" | "*": <def>, ... }? }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct InventoryGateConfig {
    /// Global fallback definition.
    pub resolver: Option<ResolverDef>,
    /// Per-class definitions; the key `"*"` is a wildcard fallback that
    /// still takes precedence over `resolver`.
    pub resolvers: HashMap<String, ResolverDef>,
}

impl InventoryGateConfig {
    pub fn with_resolver(mut self, def: ResolverDef) -> Self {
        self.resolver = Some(def);
        self
    }

    pub fn with_class_resolver(mut self, class: impl Into<String>, def: ResolverDef) -> Self {
        self.resolvers.insert(class.into(), def);
        self
    }
}

impl From<Value> for InventoryGateConfig {
    fn from(value: Value) -> Self {
        let mut config = InventoryGateConfig::default();
        let Value::Object(map) = value else {
            return config;
        };
        if let Some(def) = map.get("resolver") {
            config.resolver = Some(ResolverDef::from_value(def));
        }
        if let Some(Value::Object(entries)) = map.get("resolvers") {
            for (class, def) in entries {
                config
                    .resolvers
                    .insert(class.clone(), ResolverDef::from_value(def));
            }
        }
        config
    }
}

/// Selects and normalizes the resolver for a subject class.
///
/// Selection order: `resolvers[class]`, then `resolvers["*"]`, then the
/// global `resolver`. The normalized outcome (including "no resolver") is
/// cached per class name; flushing the cache means building a new adapter,
/// which in practice means re-registering the `inventory_gate` evaluator.
pub struct ResolverAdapter {
    config: InventoryGateConfig,
    provider: Arc<dyn ResolverProvider>,
    cache: RwLock<HashMap<String, Option<Arc<ResolverFn>>>>,
}

impl ResolverAdapter {
    pub fn new(config: InventoryGateConfig, provider: Arc<dyn ResolverProvider>) -> Self {
        Self {
            config,
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The normalized callable for a subject class, or `None` when no
    /// definition applies or the selected definition cannot be normalized.
    pub fn resolver_for(&self, class: &str) -> Option<Arc<ResolverFn>> {
        if let Some(cached) = self
            .cache
            .read()
            .expect("resolver cache lock poisoned")
            .get(class)
        {
            return cached.clone();
        }

        let resolved = self.select(class).and_then(|def| self.normalize(def));
        self.cache
            .write()
            .expect("resolver cache lock poisoned")
            .insert(class.to_string(), resolved.clone());
        resolved
    }

    fn select(&self, class: &str) -> Option<&ResolverDef> {
        self.config
            .resolvers
            .get(class)
            .or_else(|| self.config.resolvers.get("*"))
            .or(self.config.resolver.as_ref())
    }

    fn normalize(&self, def: &ResolverDef) -> Option<Arc<ResolverFn>> {
        match def {
            ResolverDef::Callable(f) => Some(f.clone()),
            ResolverDef::Named(target) => {
                let (name, method) = match target.split_once('@') {
                    Some((name, method)) => (name, method),
                    None => (target.as_str(), "resolve"),
                };
                let service = self.provider.instantiate(name)?;
                Some(bind_method(service, method.to_string()))
            }
            ResolverDef::Pair(name, method) => {
                let service = self.provider.instantiate(name)?;
                Some(bind_method(service, method.clone()))
            }
            ResolverDef::Service(service, method) => {
                Some(bind_method(service.clone(), method.clone()))
            }
            ResolverDef::Invalid => None,
        }
    }
}

impl fmt::Debug for ResolverAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn bind_method(service: Arc<dyn InventoryService>, method: String) -> Arc<ResolverFn> {
    Arc::new(move |subject, moment, config| service.call(&method, subject, moment, config))
}
