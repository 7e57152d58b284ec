//! Rendering of a check result, and the exit status it maps to.

use crate::compat::BreakingResult;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Exit status when no breaking change was found
pub const EXIT_COMPATIBLE: u8 = 0;
/// Exit status when breaking changes were found
pub const EXIT_BREAKING: u8 = 1;
/// Exit status when the check could not be completed
pub const EXIT_FAILURE: u8 = 2;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub trait Reporter {
    fn report(&self, result: &BreakingResult, out: &mut dyn Write) -> io::Result<()>;
}

pub fn reporter_for(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Text => Box::new(TextReporter),
        ReportFormat::Json => Box::new(JsonReporter),
    }
}

/// Exit status for a completed check. Rule failures recorded under the collect policy make
/// the run incomplete, which is reported as a failure rather than as a clean result.
pub fn exit_code(result: &BreakingResult) -> u8 {
    if result.has_breaking_changes {
        EXIT_BREAKING
    } else if !result.is_complete() {
        EXIT_FAILURE
    } else {
        EXIT_COMPATIBLE
    }
}

pub struct TextReporter;

impl Reporter for TextReporter {
    fn report(&self, result: &BreakingResult, out: &mut dyn Write) -> io::Result<()> {
        if result.has_breaking_changes {
            writeln!(out, "Breaking changes detected:")?;
            for change in &result.changes {
                writeln!(out, "  [{}] {}", change.rule_id, change.message)?;
                writeln!(out, "    Location: {} ({})", change.location, change.kind)?;
                writeln!(out, "    Category: {}", change.category)?;
                writeln!(out)?;
            }
            writeln!(out, "Summary:")?;
            writeln!(out, "  Total breaking changes: {}", result.changes.len())?;
            for (kind, count) in &result.summary {
                writeln!(out, "    {kind}: {count}")?;
            }
            writeln!(out, "  Rules executed: {}", result.executed_rules.len())?;
        } else {
            writeln!(out, "No breaking changes detected.")?;
            writeln!(out, "Rules executed: {}", result.executed_rules.len())?;
        }

        if !result.failed_rules.is_empty() {
            let failed: Vec<&str> = result
                .failed_rules
                .iter()
                .map(|failure| failure.rule_id.as_str())
                .collect();
            writeln!(
                out,
                "Rules failed: {} ({})",
                failed.len(),
                failed.join(", ")
            )?;
            for failure in &result.failed_rules {
                writeln!(out, "  {}: {}", failure.rule_id, failure.message)?;
            }
        }
        Ok(())
    }
}

pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, result: &BreakingResult, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, result)?;
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::engine::RuleFailure;
    use crate::compat::handlers::create_breaking_change;
    use crate::compat::{BreakingCategory, BreakingKind, BreakingLocation};
    use crate::model::{HttpMethod, OperationKey};

    fn result_with_removal() -> BreakingResult {
        let key = OperationKey::new(HttpMethod::Delete, "/users/{id}");
        let mut result = BreakingResult::new();
        result.mark_rule_executed("OPERATION_NO_DELETE".to_string());
        result.add_changes(vec![create_breaking_change(
            "OPERATION_NO_DELETE",
            BreakingKind::OperationRemoved,
            "Operation \"DELETE /users/{id}\" was deleted.".to_string(),
            BreakingLocation::operation(&key),
            BreakingCategory::Operation,
        )]);
        result
    }

    fn render(reporter: &dyn Reporter, result: &BreakingResult) -> String {
        let mut out = Vec::new();
        reporter.report(result, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_report() {
        let text = render(&TextReporter, &result_with_removal());
        assert!(text.contains("[OPERATION_NO_DELETE]"));
        assert!(text.contains("Location: DELETE /users/{id} (operation-removed)"));
        assert!(text.contains("operation-removed: 1"));

        let clean = render(&TextReporter, &BreakingResult::new());
        assert!(clean.starts_with("No breaking changes detected."));
    }

    #[test]
    fn test_json_report_round_trips() {
        let result = result_with_removal();
        let json = render(&JsonReporter, &result);
        let parsed: BreakingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&BreakingResult::new()), EXIT_COMPATIBLE);
        assert_eq!(exit_code(&result_with_removal()), EXIT_BREAKING);

        let mut incomplete = BreakingResult::new();
        incomplete.mark_rule_failed(RuleFailure {
            rule_id: "CUSTOM".to_string(),
            operation: None,
            message: "boom".to_string(),
        });
        assert_eq!(exit_code(&incomplete), EXIT_FAILURE);
    }
}
