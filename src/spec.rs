//! Provides the high-level ApiSpec API for comparing API descriptions.

use crate::compat::{BreakChecker, BreakingConfig, BreakingResult, CheckError};
use crate::generate_fingerprint;
use crate::model::Specification;
use crate::normalize::{OpenApiTransformer, Transformer, load_document};
use serde_json::Value;
use std::path::Path;

/// The result of a compatibility comparison between two API descriptions.
#[derive(Debug, PartialEq, Eq)]
pub enum Compatibility {
    /// The two descriptions are semantically identical.
    Green,
    /// The new description is backward-compatible with the old one (e.g., an operation was added).
    Yellow,
    /// The new description breaks clients of the old one.
    Red,
}

/// A single API description, holding its normalized model and fingerprint.
pub struct ApiSpec {
    /// The exact semantic fingerprint.
    pub fingerprint: String,
    /// The normalized model the rules run against.
    pub specification: Specification,
}

impl ApiSpec {
    /// Creates a new `ApiSpec` from an already-parsed OpenAPI or Swagger document.
    pub fn from_document(document: &Value) -> anyhow::Result<Self> {
        let specification = OpenApiTransformer.transform(document)?;
        Self::from_specification(specification)
    }

    /// Loads and normalizes a JSON or YAML document from disk.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let document = load_document(path)?;
        Self::from_document(&document)
    }

    pub fn from_specification(specification: Specification) -> anyhow::Result<Self> {
        let fingerprint = generate_fingerprint(&specification)?;
        Ok(ApiSpec {
            fingerprint,
            specification,
        })
    }

    /// Compares this `ApiSpec` (the "old" version) with another (the "new" version)
    /// using the built-in rule set.
    pub fn compare_with(&self, new_spec: &ApiSpec) -> Result<Compatibility, CheckError> {
        if self.fingerprint == new_spec.fingerprint {
            return Ok(Compatibility::Green);
        }

        let result = self.check_breaking_changes(new_spec)?;
        if result.has_breaking_changes {
            Ok(Compatibility::Red)
        } else {
            Ok(Compatibility::Yellow)
        }
    }

    /// Check for breaking changes using the default configuration
    pub fn check_breaking_changes(&self, new_spec: &ApiSpec) -> Result<BreakingResult, CheckError> {
        BreakChecker::with_builtin_rules().compare(&self.specification, &new_spec.specification)
    }

    /// Check for breaking changes using a custom configuration
    pub fn check_breaking_changes_with_config(
        &self,
        new_spec: &ApiSpec,
        config: &BreakingConfig,
    ) -> Result<BreakingResult, CheckError> {
        BreakChecker::from_config(config)?.compare(&self.specification, &new_spec.specification)
    }
}
