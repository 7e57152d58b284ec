//! The rule abstraction shared by built-in and user-provided rules

use crate::compat::categories::BreakingCategory;
use crate::compat::types::{BreakingKind, RuleContext, RuleResult};
use crate::model::Specification;

/// Detects one category of breaking change between an old and a new specification.
///
/// Implementations must be pure: the same pair always yields the same records in the same
/// order, neither specification is modified, and no rule relies on another having run.
/// Missing optional parts (no parameters, no response body) are valid input, not faults.
pub trait BreakingRule: Send + Sync {
    /// Stable identifier, e.g. `OPERATION_NO_DELETE`
    fn id(&self) -> &str;

    fn category(&self) -> BreakingCategory;

    /// Kinds of record this rule may produce
    fn kinds(&self) -> &[BreakingKind];

    fn check(&self, old: &Specification, new: &Specification, context: &RuleContext)
    -> RuleResult;
}

/// Signature of a built-in rule function
pub type RuleFn = fn(&Specification, &Specification, &RuleContext) -> RuleResult;

/// A built-in rule backed by a plain function, so the registry can stay a static table.
#[derive(Clone, Copy)]
pub struct StaticRule {
    pub id: &'static str,
    pub category: BreakingCategory,
    pub kinds: &'static [BreakingKind],
    pub check: RuleFn,
}

impl std::fmt::Debug for StaticRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticRule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("kinds", &self.kinds)
            .finish()
    }
}

impl BreakingRule for StaticRule {
    fn id(&self) -> &str {
        self.id
    }

    fn category(&self) -> BreakingCategory {
        self.category
    }

    fn kinds(&self) -> &[BreakingKind] {
        self.kinds
    }

    fn check(
        &self,
        old: &Specification,
        new: &Specification,
        context: &RuleContext,
    ) -> RuleResult {
        (self.check)(old, new, context)
    }
}
