//! Breaking change detection system
//!
//! This module provides the rule framework, the built-in rule set and the checker that runs
//! the rules over an old and a new API specification.

pub mod categories;
pub mod engine;
pub mod handlers;
pub mod operation_rules;
pub mod request_rules;
pub mod response_rules;
pub mod rule;
pub mod rule_registry;
pub mod schema_rules;
pub mod types;

pub use categories::BreakingCategory;
pub use engine::{
    BreakChecker, BreakingConfig, BreakingResult, CheckError, FaultPolicy, RuleFailure, Side,
};
pub use rule::{BreakingRule, StaticRule};
pub use types::{
    BreakingChange, BreakingKind, BreakingLocation, BreakingSeverity, RuleContext, RuleError,
    RuleResult,
};
