//! OPERATION rules: operations that disappear between versions.

use crate::compat::categories::BreakingCategory;
use crate::compat::handlers::create_breaking_change;
use crate::compat::types::{BreakingKind, BreakingLocation, RuleContext, RuleResult};
use crate::model::Specification;

/// OPERATION_NO_DELETE - checks operations (path + method) aren't deleted
pub fn check_operation_no_delete(
    old: &Specification,
    new: &Specification,
    context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for old_op in old.operations() {
        if new.operation(&old_op.key).is_some() {
            continue;
        }
        if old_op.deprecated && context.deprecated_removal_allowed {
            continue;
        }
        changes.push(create_breaking_change(
            "OPERATION_NO_DELETE",
            BreakingKind::OperationRemoved,
            format!("Operation \"{}\" was deleted.", old_op.key),
            BreakingLocation::operation(&old_op.key),
            BreakingCategory::Operation,
        ));
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, Operation, OperationKey};

    fn spec_with(operations: Vec<Operation>) -> Specification {
        let mut builder = Specification::builder();
        for op in operations {
            builder.add_operation(op).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_deleted_operation_is_reported() {
        let key = OperationKey::new(HttpMethod::Delete, "/users/{id}");
        let old = spec_with(vec![Operation::new(key.clone())]);
        let new = spec_with(vec![]);

        let changes = check_operation_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, BreakingKind::OperationRemoved);
        assert_eq!(changes[0].location.to_string(), "DELETE /users/{id}");
    }

    #[test]
    fn test_deprecated_operation_removal_follows_context() {
        let mut op = Operation::new(OperationKey::new(HttpMethod::Get, "/legacy"));
        op.deprecated = true;
        let old = spec_with(vec![op]);
        let new = spec_with(vec![]);

        let allowed = check_operation_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert!(allowed.is_empty());

        let strict = RuleContext {
            deprecated_removal_allowed: false,
        };
        let denied = check_operation_no_delete(&old, &new, &strict).unwrap();
        assert_eq!(denied.len(), 1);
    }

    #[test]
    fn test_added_operation_is_not_breaking() {
        let old = spec_with(vec![]);
        let new = spec_with(vec![Operation::new(OperationKey::new(
            HttpMethod::Post,
            "/users",
        ))]);
        let changes = check_operation_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert!(changes.is_empty());
    }
}
