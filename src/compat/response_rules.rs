//! RESPONSE rules: data existing callers read from responses.

use crate::compat::categories::BreakingCategory;
use crate::compat::handlers::{create_breaking_change, join_field, response_roots, walk_schema_pair};
use crate::compat::types::{BreakingKind, BreakingLocation, RuleContext, RuleResult};
use crate::model::Specification;

/// RESPONSE_NO_DELETE - checks documented status codes of a kept operation aren't deleted
pub fn check_response_no_delete(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for (old_op, new_op) in old.shared_operations(new) {
        for status in old_op.responses.keys() {
            if !new_op.responses.contains_key(status) {
                changes.push(create_breaking_change(
                    "RESPONSE_NO_DELETE",
                    BreakingKind::ResponseRemoved,
                    format!("Response \"{}\" was deleted from \"{}\".", status, old_op.key),
                    BreakingLocation::response(&old_op.key, status),
                    BreakingCategory::Response,
                ));
            }
        }
    }

    Ok(changes)
}

/// RESPONSE_FIELD_NO_DELETE - checks response object fields aren't deleted, at any depth
pub fn check_response_field_no_delete(
    old: &Specification,
    new: &Specification,
    _context: &RuleContext,
) -> RuleResult {
    let mut changes = Vec::new();

    for (old_op, new_op) in old.shared_operations(new) {
        for root in response_roots(old_op, new_op) {
            walk_schema_pair(old, root.old, new, root.new, &mut |pair| {
                let (Some(old_properties), Some(new_properties)) =
                    (pair.old.properties(), pair.new.properties())
                else {
                    return;
                };
                for name in old_properties.keys() {
                    if new_properties.contains_key(name) {
                        continue;
                    }
                    let field = join_field(pair.field, name);
                    changes.push(create_breaking_change(
                        "RESPONSE_FIELD_NO_DELETE",
                        BreakingKind::ResponseFieldRemoved,
                        format!(
                            "Response field \"{}\" was deleted from \"{}\" ({}).",
                            field,
                            root.key,
                            root.location.status.as_deref().unwrap_or_default()
                        ),
                        root.location.clone().with_field(&field),
                        BreakingCategory::Response,
                    ));
                }
            });
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        HttpMethod, Operation, OperationKey, PrimitiveType, Response, Schema, SchemaKind,
    };
    use std::collections::{BTreeMap, BTreeSet};

    fn user_response(fields: &[&str], statuses: &[&str]) -> Specification {
        let mut builder = Specification::builder();
        let mut properties = BTreeMap::new();
        for field in fields {
            let id = builder.add_schema(Schema::primitive(PrimitiveType::String));
            properties.insert(field.to_string(), id);
        }
        builder
            .add_named_schema(
                "User",
                Schema::new(SchemaKind::Object {
                    properties,
                    required: BTreeSet::new(),
                }),
            )
            .unwrap();
        let mut op = Operation::new(OperationKey::new(HttpMethod::Get, "/users/{id}"));
        for status in statuses {
            let schema = builder.add_schema(Schema::new(SchemaKind::Ref("User".into())));
            op.responses.insert(
                status.to_string(),
                Response {
                    status: status.to_string(),
                    schema: Some(schema),
                },
            );
        }
        builder.add_operation(op).unwrap();
        builder.build()
    }

    #[test]
    fn test_deleted_response_field() {
        let old = user_response(&["id", "name", "email"], &["200"]);
        let new = user_response(&["id", "name"], &["200"]);

        let changes =
            check_response_field_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].location.field.as_deref(), Some("email"));
        assert_eq!(changes[0].location.to_string(), "GET /users/{id}[200].email");
    }

    #[test]
    fn test_added_response_field_is_not_breaking() {
        let old = user_response(&["id"], &["200"]);
        let new = user_response(&["id", "nickname"], &["200"]);
        let changes =
            check_response_field_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_deleted_status_code() {
        let old = user_response(&["id"], &["200", "404"]);
        let new = user_response(&["id"], &["200"]);

        let changes = check_response_no_delete(&old, &new, &RuleContext::default()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].location.status.as_deref(), Some("404"));
    }
}
