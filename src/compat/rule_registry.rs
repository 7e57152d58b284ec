//! Built-in rule registry
//!
//! The table order is the configuration order: the checker runs rules and concatenates their
//! records in exactly this sequence.

use crate::compat::categories::BreakingCategory;
use crate::compat::operation_rules;
use crate::compat::request_rules;
use crate::compat::response_rules;
use crate::compat::rule::StaticRule;
use crate::compat::schema_rules;
use crate::compat::types::BreakingKind;

/// All built-in rules, in configuration order
pub fn get_builtin_rules() -> &'static [StaticRule] {
    BUILTIN_RULES
}

/// Find a built-in rule by ID
pub fn find_builtin_rule(rule_id: &str) -> Option<&'static StaticRule> {
    BUILTIN_RULES.iter().find(|rule| rule.id == rule_id)
}

/// Static rule table
const BUILTIN_RULES: &[StaticRule] = &[
    // OPERATION rules (1 rule)
    StaticRule {
        id: "OPERATION_NO_DELETE",
        category: BreakingCategory::Operation,
        kinds: &[BreakingKind::OperationRemoved],
        check: operation_rules::check_operation_no_delete,
    },
    // REQUEST rules (3 rules)
    StaticRule {
        id: "PARAMETER_NO_DELETE",
        category: BreakingCategory::Request,
        kinds: &[BreakingKind::ParameterRemoved],
        check: request_rules::check_parameter_no_delete,
    },
    StaticRule {
        id: "PARAMETER_NOW_REQUIRED",
        category: BreakingCategory::Request,
        kinds: &[BreakingKind::ParameterNowRequired],
        check: request_rules::check_parameter_now_required,
    },
    StaticRule {
        id: "REQUEST_FIELD_NOW_REQUIRED",
        category: BreakingCategory::Request,
        kinds: &[BreakingKind::RequestFieldNowRequired],
        check: request_rules::check_request_field_now_required,
    },
    // RESPONSE rules (2 rules)
    StaticRule {
        id: "RESPONSE_NO_DELETE",
        category: BreakingCategory::Response,
        kinds: &[BreakingKind::ResponseRemoved],
        check: response_rules::check_response_no_delete,
    },
    StaticRule {
        id: "RESPONSE_FIELD_NO_DELETE",
        category: BreakingCategory::Response,
        kinds: &[BreakingKind::ResponseFieldRemoved],
        check: response_rules::check_response_field_no_delete,
    },
    // SCHEMA rules (3 rules)
    StaticRule {
        id: "FIELD_SAME_TYPE",
        category: BreakingCategory::Schema,
        kinds: &[BreakingKind::TypeChanged],
        check: schema_rules::check_field_same_type,
    },
    StaticRule {
        id: "ENUM_VALUE_NO_DELETE",
        category: BreakingCategory::Schema,
        kinds: &[BreakingKind::EnumValueRemoved],
        check: schema_rules::check_enum_value_no_delete,
    },
    StaticRule {
        id: "SCHEMA_SAME_CONSTRAINTS",
        category: BreakingCategory::Schema,
        kinds: &[BreakingKind::FormatChanged, BreakingKind::NullableRemoved],
        check: schema_rules::check_schema_same_constraints,
    },
];

/// Get count of all built-in rules
pub const fn get_builtin_rule_count() -> usize {
    BUILTIN_RULES.len()
}

/// Verify rule consistency: unique IDs, and every kind owned by exactly one rule
pub fn verify_builtin_rules() -> Result<(), String> {
    let mut seen_ids = std::collections::HashSet::new();
    let mut kind_owners = std::collections::HashMap::new();
    for rule in BUILTIN_RULES {
        if !seen_ids.insert(rule.id) {
            return Err(format!("Duplicate rule ID: {}", rule.id));
        }
        for kind in rule.kinds {
            if let Some(owner) = kind_owners.insert(*kind, rule.id) {
                return Err(format!(
                    "Kind {} is produced by both {} and {}",
                    kind, owner, rule.id
                ));
            }
        }
    }
    Ok(())
}
