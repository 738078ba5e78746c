//! Rule registry: a name-keyed table of rule factories, built once at
//! startup and consulted by the section manager for every `RuleConfigRef`
//! a section declares.

use std::collections::HashMap;

use crate::api::traits::{Rule, RuleFactory};
use crate::rules;

/// Maps rule names (as used in `rules.yaml`) to factories producing a fresh
/// `Box<dyn Rule>` per evaluation, so rules may hold per-MR state via
/// `set_mr_context` without leaking it across merge requests.
pub struct RuleRegistry {
    factories: HashMap<&'static str, RuleFactory>,
}

impl RuleRegistry {
    /// The registry naysayer ships with, covering every built-in rule.
    pub fn builtin() -> Self {
        let mut registry = Self { factories: HashMap::new() };
        registry.register("warehouse_size", Box::new(|| Box::new(rules::warehouse::WarehouseRule::default())));
        registry.register("consumer_only", Box::new(|| Box::new(rules::consumer::ConsumerRule::default())));
        registry.register("toc_approval", Box::new(|| Box::new(rules::toc::TocApprovalRule::default())));
        registry.register("metadata", Box::new(|| Box::new(rules::metadata::MetadataRule::default())));
        registry.register(
            "service_account",
            Box::new(|| Box::new(rules::service_account::ServiceAccountRule::default())),
        );
        registry.register(
            "source_binding",
            Box::new(|| Box::new(rules::source_binding::SourceBindingRule::default())),
        );
        tracing::debug!(rules = registry.names().len(), "built-in rule registry initialized");
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: RuleFactory) {
        if self.factories.insert(name, factory).is_some() {
            tracing::debug!(rule = name, "rule factory replaced");
        }
    }

    /// Build a fresh rule instance for `name`, or `None` if unregistered.
    pub fn get(&self, name: &str) -> Option<Box<dyn Rule>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
