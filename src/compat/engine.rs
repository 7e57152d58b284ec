//! Breaking change detection engine
//!
//! [`BreakChecker`] runs every configured rule against the same pair of specifications and
//! concatenates their records in configuration order. It keeps no state between checks.
//!
//! Rule faults follow [`FaultPolicy`]. The default, `FailFast`, aborts the whole check on the
//! first fault so an incomplete result is never mistaken for "nothing found"; `Collect` records
//! the fault in [`BreakingResult::failed_rules`] and carries on with the remaining rules.
//! A panicking rule is caught and handled as a fault under either policy.

use crate::compat::categories::BreakingCategory;
use crate::compat::rule::BreakingRule;
use crate::compat::rule_registry;
use crate::compat::types::{BreakingChange, RuleContext, RuleError, RuleResult};
use crate::model::Specification;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// Configuration for breaking change detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingConfig {
    /// Categories to enable (if empty, all categories)
    #[serde(default)]
    pub use_categories: Vec<String>,
    /// Specific rules to enable (overrides categories if specified)
    #[serde(default)]
    pub use_rules: Vec<String>,
    /// Rules to explicitly disable
    #[serde(default)]
    pub except_rules: Vec<String>,
    /// Path prefixes whose changes are not reported
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Whether operations deprecated in the old API may be removed
    #[serde(default = "default_true")]
    pub deprecated_removal_allowed: bool,
    /// What to do when a rule fails unexpectedly
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    /// Evaluate rules on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl BreakingConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        #[derive(serde::Deserialize)]
        struct ConfigFile {
            breaking: Option<BreakingConfig>,
        }

        let config_file: ConfigFile = serde_yaml::from_str(yaml)?;
        Ok(config_file.breaking.unwrap_or_default())
    }
}

impl Default for BreakingConfig {
    fn default() -> Self {
        Self {
            use_categories: Vec::new(),
            use_rules: Vec::new(),
            except_rules: Vec::new(),
            excluded_paths: Vec::new(),
            deprecated_removal_allowed: true,
            fault_policy: FaultPolicy::default(),
            parallel: false,
        }
    }
}

/// Behaviour on an unexpected rule fault
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Abort the check and surface the fault
    #[default]
    FailFast,
    /// Record the fault as a reportable event and continue with the other rules
    Collect,
}

/// Which input of [`BreakChecker::check`] was absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Old => f.write_str("oldApi"),
            Side::New => f.write_str("newApi"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("{0} must be provided")]
    MissingSpecification(Side),
    #[error("rule {rule_id} failed{}: {message}", .operation.as_ref().map(|op| format!(" on {op}")).unwrap_or_default())]
    RuleFault {
        rule_id: String,
        operation: Option<String>,
        message: String,
    },
    #[error("unknown rule: {0}")]
    UnknownRule(String),
    #[error("unknown breaking category: {0}")]
    UnknownCategory(String),
}

/// A rule fault recorded under [`FaultPolicy::Collect`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub message: String,
}

/// Result of breaking change detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakingResult {
    /// All breaking changes found, in configuration order
    pub changes: Vec<BreakingChange>,
    /// Whether any breaking changes were found
    pub has_breaking_changes: bool,
    /// Number of changes per kind
    pub summary: BTreeMap<String, usize>,
    /// Rules that were executed
    pub executed_rules: Vec<String>,
    /// Rules that failed to execute
    pub failed_rules: Vec<RuleFailure>,
}

impl BreakingResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            has_breaking_changes: false,
            summary: BTreeMap::new(),
            executed_rules: Vec::new(),
            failed_rules: Vec::new(),
        }
    }

    /// Add breaking changes to the result
    pub fn add_changes(&mut self, new_changes: Vec<BreakingChange>) {
        self.has_breaking_changes = !new_changes.is_empty() || self.has_breaking_changes;

        for change in &new_changes {
            *self.summary.entry(change.kind.id().to_string()).or_insert(0) += 1;
        }

        self.changes.extend(new_changes);
    }

    /// Mark a rule as executed successfully
    pub fn mark_rule_executed(&mut self, rule_id: String) {
        self.executed_rules.push(rule_id);
    }

    /// Mark a rule as failed
    pub fn mark_rule_failed(&mut self, failure: RuleFailure) {
        self.failed_rules.push(failure);
    }

    /// Whether every configured rule ran to completion
    pub fn is_complete(&self) -> bool {
        self.failed_rules.is_empty()
    }
}

impl Default for BreakingResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the configured rules over an (old, new) pair of specifications
pub struct BreakChecker {
    rules: Vec<Box<dyn BreakingRule>>,
    context: RuleContext,
    fault_policy: FaultPolicy,
    parallel: bool,
    excluded_paths: Vec<String>,
}

impl BreakChecker {
    /// Create a checker over an explicit, ordered rule list
    pub fn new(rules: Vec<Box<dyn BreakingRule>>) -> Self {
        Self {
            rules,
            context: RuleContext::default(),
            fault_policy: FaultPolicy::default(),
            parallel: false,
            excluded_paths: Vec::new(),
        }
    }

    /// Create a checker with every built-in rule
    pub fn with_builtin_rules() -> Self {
        Self::new(
            rule_registry::get_builtin_rules()
                .iter()
                .map(|rule| Box::new(*rule) as Box<dyn BreakingRule>)
                .collect(),
        )
    }

    /// Create a checker from configuration, selecting built-in rules by ID and category
    pub fn from_config(config: &BreakingConfig) -> Result<Self, CheckError> {
        for rule_id in config.use_rules.iter().chain(&config.except_rules) {
            if rule_registry::find_builtin_rule(rule_id).is_none() {
                return Err(CheckError::UnknownRule(rule_id.clone()));
            }
        }
        let categories = config
            .use_categories
            .iter()
            .map(|id| {
                BreakingCategory::from_id(id).ok_or_else(|| CheckError::UnknownCategory(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rules = rule_registry::get_builtin_rules()
            .iter()
            .filter(|rule| !config.except_rules.iter().any(|id| id == rule.id))
            .filter(|rule| {
                if !config.use_rules.is_empty() {
                    config.use_rules.iter().any(|id| id == rule.id)
                } else {
                    categories.is_empty() || categories.contains(&rule.category)
                }
            })
            .map(|rule| Box::new(*rule) as Box<dyn BreakingRule>)
            .collect();

        let mut checker = Self::new(rules)
            .with_fault_policy(config.fault_policy)
            .with_parallel(config.parallel)
            .with_excluded_paths(config.excluded_paths.clone());
        checker.context.deprecated_removal_allowed = config.deprecated_removal_allowed;
        Ok(checker)
    }

    /// Append a rule after the currently configured ones
    pub fn with_rule(mut self, rule: Box<dyn BreakingRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_context(mut self, context: RuleContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_fault_policy(mut self, fault_policy: FaultPolicy) -> Self {
        self.fault_policy = fault_policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_excluded_paths(mut self, excluded_paths: Vec<String>) -> Self {
        self.excluded_paths = excluded_paths;
        self
    }

    /// IDs of the configured rules, in the order they run
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Check for breaking changes between an old and a new specification
    ///
    /// Both inputs are required; an absent one fails before any rule runs. A specification
    /// with no operations is valid input.
    pub fn check(
        &self,
        old: Option<&Specification>,
        new: Option<&Specification>,
    ) -> Result<BreakingResult, CheckError> {
        let old = old.ok_or(CheckError::MissingSpecification(Side::Old))?;
        let new = new.ok_or(CheckError::MissingSpecification(Side::New))?;

        let mut result = BreakingResult::new();

        if self.parallel {
            // collect() on an indexed parallel iterator keeps configuration order
            let outcomes: Vec<RuleResult> = self
                .rules
                .par_iter()
                .map(|rule| self.run_rule(rule.as_ref(), old, new))
                .collect();
            for (rule, outcome) in self.rules.iter().zip(outcomes) {
                self.record(&mut result, rule.as_ref(), outcome)?;
            }
        } else {
            for rule in &self.rules {
                let outcome = self.run_rule(rule.as_ref(), old, new);
                self.record(&mut result, rule.as_ref(), outcome)?;
            }
        }

        Ok(result)
    }

    /// Convenience wrapper for callers holding both specifications
    pub fn compare(
        &self,
        old: &Specification,
        new: &Specification,
    ) -> Result<BreakingResult, CheckError> {
        self.check(Some(old), Some(new))
    }

    fn run_rule(
        &self,
        rule: &dyn BreakingRule,
        old: &Specification,
        new: &Specification,
    ) -> RuleResult {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(old, new, &self.context)))
            .unwrap_or_else(|payload| {
                Err(RuleError::new(format!(
                    "rule panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
        debug!(
            rule = rule.id(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Rule evaluated"
        );
        outcome
    }

    fn record(
        &self,
        result: &mut BreakingResult,
        rule: &dyn BreakingRule,
        outcome: RuleResult,
    ) -> Result<(), CheckError> {
        match outcome {
            Ok(mut changes) => {
                if !self.excluded_paths.is_empty() {
                    changes.retain(|change| {
                        !self
                            .excluded_paths
                            .iter()
                            .any(|prefix| is_excluded_path(&change.location.path, prefix))
                    });
                }
                result.mark_rule_executed(rule.id().to_string());
                result.add_changes(changes);
                Ok(())
            }
            Err(fault) => {
                let operation = fault.operation.as_ref().map(ToString::to_string);
                match self.fault_policy {
                    FaultPolicy::FailFast => Err(CheckError::RuleFault {
                        rule_id: rule.id().to_string(),
                        operation,
                        message: fault.message,
                    }),
                    FaultPolicy::Collect => {
                        warn!(rule = rule.id(), error = %fault, "Rule failed, continuing");
                        result.mark_rule_failed(RuleFailure {
                            rule_id: rule.id().to_string(),
                            operation,
                            message: fault.message,
                        });
                        Ok(())
                    }
                }
            }
        }
    }
}

impl Default for BreakChecker {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

/// Whether `path` lies under `prefix`, matching whole path segments only.
fn is_excluded_path(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix.trim_end_matches('/')) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
