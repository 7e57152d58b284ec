//! Core types for breaking change detection

use crate::model::{HttpMethod, OperationKey, ParameterLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a breaking change detected between two API specifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingChange {
    /// The rule ID that detected this change
    pub rule_id: String,
    /// Category of incompatibility
    pub kind: BreakingKind,
    /// Human-readable description of the breaking change
    pub message: String,
    /// Where in the specification the change was found
    pub location: BreakingLocation,
    /// Severity level of the breaking change
    pub severity: BreakingSeverity,
    /// Category of the rule that produced this change
    pub category: String,
}

/// Which kind of incompatibility a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakingKind {
    OperationRemoved,
    ParameterRemoved,
    ParameterNowRequired,
    RequestFieldNowRequired,
    ResponseRemoved,
    ResponseFieldRemoved,
    TypeChanged,
    EnumValueRemoved,
    FormatChanged,
    NullableRemoved,
}

impl BreakingKind {
    pub fn id(&self) -> &'static str {
        match self {
            BreakingKind::OperationRemoved => "operation-removed",
            BreakingKind::ParameterRemoved => "parameter-removed",
            BreakingKind::ParameterNowRequired => "parameter-now-required",
            BreakingKind::RequestFieldNowRequired => "request-field-now-required",
            BreakingKind::ResponseRemoved => "response-removed",
            BreakingKind::ResponseFieldRemoved => "response-field-removed",
            BreakingKind::TypeChanged => "type-changed",
            BreakingKind::EnumValueRemoved => "enum-value-removed",
            BreakingKind::FormatChanged => "format-changed",
            BreakingKind::NullableRemoved => "nullable-removed",
        }
    }
}

impl fmt::Display for BreakingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Pointer into the specification where a breaking change was found.
///
/// Rendered as `METHOD /path`, followed by `.param` for parameters, `[status]` for responses
/// and `.field.path` for schema fields, e.g. `GET /users/{id}[200].email`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BreakingLocation {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_location: Option<ParameterLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl BreakingLocation {
    pub fn operation(key: &OperationKey) -> Self {
        Self {
            method: key.method,
            path: key.path.clone(),
            parameter: None,
            parameter_location: None,
            status: None,
            field: None,
        }
    }

    pub fn parameter(key: &OperationKey, name: &str, location: ParameterLocation) -> Self {
        Self {
            parameter: Some(name.to_string()),
            parameter_location: Some(location),
            ..Self::operation(key)
        }
    }

    pub fn response(key: &OperationKey, status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::operation(key)
        }
    }

    /// Attach a field path; an empty path means the schema root and leaves the location as is.
    pub fn with_field(mut self, field: &str) -> Self {
        if !field.is_empty() {
            self.field = Some(field.to_string());
        }
        self
    }
}

impl fmt::Display for BreakingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(parameter) = &self.parameter {
            write!(f, ".{parameter}")?;
        }
        if let Some(status) = &self.status {
            write!(f, "[{status}]")?;
        }
        if let Some(field) = &self.field {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

/// Severity levels for breaking changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakingSeverity {
    /// Critical breaking change that will definitely break clients
    Error,
    /// Warning about potential compatibility issues
    Warning,
}

/// Read-only options handed to every rule
#[derive(Debug, Clone)]
pub struct RuleContext {
    /// Whether operations marked deprecated in the old API may be removed
    pub deprecated_removal_allowed: bool,
}

impl Default for RuleContext {
    fn default() -> Self {
        Self {
            deprecated_removal_allowed: true,
        }
    }
}

/// An unexpected fault raised while a rule evaluated a specification pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
    pub message: String,
    /// The operation being inspected when the fault happened, if known
    pub operation: Option<OperationKey>,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: None,
        }
    }

    pub fn at(mut self, operation: &OperationKey) -> Self {
        self.operation = Some(operation.clone());
        self
    }
}

/// Result of a single rule check
pub type RuleResult = Result<Vec<BreakingChange>, RuleError>;
