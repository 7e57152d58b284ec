//! REQUEST rules: inputs that existing callers no longer satisfy.

use crate::compat::categories::BreakingCategory;
use crate::compat::handlers::{create_breaking_change, join_field, walk_schema_pair};
use crate::compat::types::{BreakingKind, BreakingLocation, RuleContext, RuleResult};
use crate::model::{ParameterLocation, Specification};

/// PARAMETER_NO_DELETE - checks parameters of a kept operation aren't deleted
pub fn check_parameter_no_delete(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for (old_op, new_op) in old.shared_operations(new) {
        for old_param in &old_op.parameters {
            if new_op
                .parameter(&old_param.name, old_param.location)
                .is_none()
            {
                changes.push(create_breaking_change(
                    "PARAMETER_NO_DELETE",
                    BreakingKind::ParameterRemoved,
                    format!(
                        "{} parameter \"{}\" was deleted from \"{}\".",
                        old_param.location, old_param.name, old_op.key
                    ),
                    BreakingLocation::parameter(&old_op.key, &old_param.name, old_param.location),
                    BreakingCategory::Request,
                ));
            }
        }
    }

    Ok(changes)
}

/// PARAMETER_NOW_REQUIRED - checks no parameter becomes required, and no required one is added
pub fn check_parameter_now_required(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for (old_op, new_op) in old.shared_operations(new) {
        for new_param in new_op.parameters.iter().filter(|p| p.required) {
            let message = match old_op.parameter(&new_param.name, new_param.location) {
                Some(old_param) if old_param.required => continue,
                Some(_) => format!(
                    "{} parameter \"{}\" of \"{}\" changed from optional to required.",
                    new_param.location, new_param.name, new_op.key
                ),
                None => format!(
                    "Required {} parameter \"{}\" was added to \"{}\".",
                    new_param.location, new_param.name, new_op.key
                ),
            };
            changes.push(create_breaking_change(
                "PARAMETER_NOW_REQUIRED",
                BreakingKind::ParameterNowRequired,
                message,
                BreakingLocation::parameter(&new_op.key, &new_param.name, new_param.location),
                BreakingCategory::Request,
            ));
        }
    }

    Ok(changes)
}

/// REQUEST_FIELD_NOW_REQUIRED - checks request body objects don't gain required fields
pub fn check_request_field_now_required(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for (old_op, new_op) in old.shared_operations(new) {
        let (Some(old_body), Some(new_body)) = (old_op.request_body(), new_op.request_body())
        else {
            continue;
        };
        let (Some(old_schema), Some(new_schema)) = (old_body.schema, new_body.schema) else {
            continue;
        };
        let base =
            BreakingLocation::parameter(&old_op.key, &old_body.name, ParameterLocation::Body);

        walk_schema_pair(old, old_schema, new, new_schema, &mut |pair| {
            let (Some(old_required), Some(new_required)) =
                (pair.old.required_fields(), pair.new.required_fields())
            else {
                return;
            };
            for name in new_required.difference(old_required) {
                let field = join_field(pair.field, name);
                changes.push(create_breaking_change(
                    "REQUEST_FIELD_NOW_REQUIRED",
                    BreakingKind::RequestFieldNowRequired,
                    format!(
                        "Request field \"{}\" of \"{}\" is now required.",
                        field, old_op.key
                    ),
                    base.clone().with_field(&field),
                    BreakingCategory::Request,
                ));
            }
        });
    }

    Ok(changes)
}
