//! Shared helpers for rule implementations
//!
//! Rules compare schemas through [`walk_schema_pair`], which resolves named references on both
//! sides and walks the two trees in parallel. Pairs already on the current path are skipped, so
//! recursive schemas terminate while schemas shared by several fields are still visited at every
//! place they are used.

use crate::compat::categories::BreakingCategory;
use crate::compat::types::{BreakingChange, BreakingKind, BreakingLocation, BreakingSeverity};
use crate::model::{Operation, OperationKey, Schema, SchemaId, SchemaKind, Specification};
use std::collections::HashSet;

/// Helper function to create a breaking change
pub fn create_breaking_change(
    rule_id: &str,
    kind: BreakingKind,
    message: String,
    location: BreakingLocation,
    category: BreakingCategory,
) -> BreakingChange {
    BreakingChange {
        rule_id: rule_id.to_string(),
        kind,
        message,
        location,
        severity: BreakingSeverity::Error,
        category: category.id().to_string(),
    }
}

/// Join a field path with a property name.
pub fn join_field(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Which side of the exchange a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the client: narrowing breaks existing callers
    Request,
    /// Returned to the client: removing data breaks existing callers
    Response,
}

/// A schema present on both sides of one operation, with its location.
#[derive(Debug, Clone)]
pub struct SchemaRoot<'a> {
    pub key: &'a OperationKey,
    pub location: BreakingLocation,
    pub direction: Direction,
    pub old: SchemaId,
    pub new: SchemaId,
}

/// Parameter (including request body) schemas of an operation present in both versions.
pub fn request_roots<'a>(old_op: &'a Operation, new_op: &'a Operation) -> Vec<SchemaRoot<'a>> {
    old_op
        .parameters
        .iter()
        .filter_map(|old_param| {
            let new_param = new_op.parameter(&old_param.name, old_param.location)?;
            Some(SchemaRoot {
                key: &old_op.key,
                location: BreakingLocation::parameter(
                    &old_op.key,
                    &old_param.name,
                    old_param.location,
                ),
                direction: Direction::Request,
                old: old_param.schema?,
                new: new_param.schema?,
            })
        })
        .collect()
}

/// Response schemas of an operation present in both versions, by status code.
pub fn response_roots<'a>(old_op: &'a Operation, new_op: &'a Operation) -> Vec<SchemaRoot<'a>> {
    old_op
        .responses
        .iter()
        .filter_map(|(status, old_response)| {
            let new_response = new_op.responses.get(status)?;
            Some(SchemaRoot {
                key: &old_op.key,
                location: BreakingLocation::response(&old_op.key, status),
                direction: Direction::Response,
                old: old_response.schema?,
                new: new_response.schema?,
            })
        })
        .collect()
}

/// Every shared schema root of two specifications: requests first, then responses, per operation.
pub fn all_schema_roots<'a>(
    old: &'a Specification,
    new: &'a Specification,
) -> Vec<SchemaRoot<'a>> {
    old.shared_operations(new)
        .flat_map(|(old_op, new_op)| {
            let mut roots = request_roots(old_op, new_op);
            roots.extend(response_roots(old_op, new_op));
            roots
        })
        .collect()
}

/// Two resolved schema nodes found at the same field path.
#[derive(Debug)]
pub struct SchemaNodePair<'a> {
    /// Dotted field path from the root; empty for the root itself, `[]` marks array items
    pub field: &'a str,
    pub old: &'a Schema,
    pub new: &'a Schema,
}

/// Walk the old and new schema trees in parallel, calling `visit` for every node pair.
///
/// Only structure present on both sides is descended into; rules look at the properties of
/// the visited pair themselves to find removed or added members.
pub fn walk_schema_pair<'a, F>(
    old_spec: &'a Specification,
    old_id: SchemaId,
    new_spec: &'a Specification,
    new_id: SchemaId,
    visit: &mut F,
) where
    F: FnMut(&SchemaNodePair<'_>),
{
    let mut on_path = HashSet::new();
    walk(old_spec, old_id, new_spec, new_id, "", &mut on_path, visit);
}

fn walk<'a, F>(
    old_spec: &'a Specification,
    old_id: SchemaId,
    new_spec: &'a Specification,
    new_id: SchemaId,
    field: &str,
    on_path: &mut HashSet<(SchemaId, SchemaId)>,
    visit: &mut F,
) where
    F: FnMut(&SchemaNodePair<'_>),
{
    let (Some((old_resolved, old)), Some((new_resolved, new))) =
        (old_spec.resolve(old_id), new_spec.resolve(new_id))
    else {
        return;
    };
    if !on_path.insert((old_resolved, new_resolved)) {
        return;
    }

    visit(&SchemaNodePair { field, old, new });

    match (&old.kind, &new.kind) {
        (
            SchemaKind::Object {
                properties: old_properties,
                ..
            },
            SchemaKind::Object {
                properties: new_properties,
                ..
            },
        ) => {
            for (name, old_child) in old_properties {
                if let Some(new_child) = new_properties.get(name) {
                    let child_field = join_field(field, name);
                    walk(
                        old_spec,
                        *old_child,
                        new_spec,
                        *new_child,
                        &child_field,
                        on_path,
                        visit,
                    );
                }
            }
        }
        (SchemaKind::Array(old_items), SchemaKind::Array(new_items)) => {
            let item_field = format!("{field}[]");
            walk(
                old_spec,
                *old_items,
                new_spec,
                *new_items,
                &item_field,
                on_path,
                visit,
            );
        }
        _ => {}
    }

    on_path.remove(&(old_resolved, new_resolved));
}
