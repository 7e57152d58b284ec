//! SCHEMA rules: type and constraint narrowing of parameter, request and response schemas.

use crate::compat::categories::BreakingCategory;
use crate::compat::handlers::{
    Direction, all_schema_roots, create_breaking_change, walk_schema_pair,
};
use crate::compat::types::{BreakingKind, RuleContext, RuleResult};
use crate::model::{PrimitiveType, SchemaKind, Specification};

/// Whether every value valid for `old` is also valid for `new`, looking at the type only.
fn is_superset_type(old: &SchemaKind, new: &SchemaKind) -> bool {
    match (old, new) {
        (SchemaKind::Any | SchemaKind::Ref(_), _) | (_, SchemaKind::Any | SchemaKind::Ref(_)) => {
            true
        }
        (SchemaKind::Primitive(old), SchemaKind::Primitive(new)) => {
            old == new || (*old == PrimitiveType::Integer && *new == PrimitiveType::Number)
        }
        (SchemaKind::Object { .. }, SchemaKind::Object { .. }) => true,
        (SchemaKind::Array(_), SchemaKind::Array(_)) => true,
        _ => false,
    }
}

/// FIELD_SAME_TYPE - checks a schema's type is not replaced by an incompatible one
pub fn check_field_same_type(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for root in all_schema_roots(old, new) {
        walk_schema_pair(old, root.old, new, root.new, &mut |pair| {
            if is_superset_type(&pair.old.kind, &pair.new.kind) {
                return;
            }
            let location = root.location.clone().with_field(pair.field);
            changes.push(create_breaking_change(
                "FIELD_SAME_TYPE",
                BreakingKind::TypeChanged,
                format!(
                    "Type of \"{}\" changed from \"{}\" to \"{}\".",
                    location,
                    pair.old.kind.type_name(),
                    pair.new.kind.type_name()
                ),
                location,
                BreakingCategory::Schema,
            ));
        });
    }

    Ok(changes)
}

/// ENUM_VALUE_NO_DELETE - checks values allowed by an enum stay allowed
pub fn check_enum_value_no_delete(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for root in all_schema_roots(old, new) {
        walk_schema_pair(old, root.old, new, root.new, &mut |pair| {
            if pair.new.enum_values.is_empty() {
                return;
            }
            let location = root.location.clone().with_field(pair.field);
            if pair.old.enum_values.is_empty() {
                // A response narrowed to an enum still returns values the client understands.
                if root.direction == Direction::Request {
                    changes.push(create_breaking_change(
                        "ENUM_VALUE_NO_DELETE",
                        BreakingKind::EnumValueRemoved,
                        format!("\"{location}\" is now restricted to an enum."),
                        location,
                        BreakingCategory::Schema,
                    ));
                }
                return;
            }
            for value in &pair.old.enum_values {
                if !pair.new.enum_values.contains(value) {
                    changes.push(create_breaking_change(
                        "ENUM_VALUE_NO_DELETE",
                        BreakingKind::EnumValueRemoved,
                        format!("Enum value {value} was deleted from \"{location}\"."),
                        location.clone(),
                        BreakingCategory::Schema,
                    ));
                }
            }
        });
    }

    Ok(changes)
}

/// SCHEMA_SAME_CONSTRAINTS - checks format changes and request nullability removal
pub fn check_schema_same_constraints(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for root in all_schema_roots(old, new) {
        walk_schema_pair(old, root.old, new, root.new, &mut |pair| {
            let location = root.location.clone().with_field(pair.field);

            let format_changed = match (&pair.old.format, &pair.new.format) {
                (Some(old_format), Some(new_format)) => old_format != new_format,
                (None, Some(_)) => root.direction == Direction::Request,
                _ => false,
            };
            if format_changed {
                changes.push(create_breaking_change(
                    "SCHEMA_SAME_CONSTRAINTS",
                    BreakingKind::FormatChanged,
                    format!(
                        "Format of \"{}\" changed from \"{}\" to \"{}\".",
                        location,
                        pair.old.format.as_deref().unwrap_or("none"),
                        pair.new.format.as_deref().unwrap_or("none")
                    ),
                    location.clone(),
                    BreakingCategory::Schema,
                ));
            }

            if root.direction == Direction::Request && pair.old.nullable && !pair.new.nullable {
                changes.push(create_breaking_change(
                    "SCHEMA_SAME_CONSTRAINTS",
                    BreakingKind::NullableRemoved,
                    format!("\"{location}\" no longer accepts null."),
                    location,
                    BreakingCategory::Schema,
                ));
            }
        });
    }

    Ok(changes)
}
