//! End-to-end run: obtain both API documents, transform them, check and report.

use crate::artifact::{ArtifactCoordinate, ArtifactError, ArtifactResolver, ResolvedArtifact};
use crate::compat::{BreakChecker, BreakingConfig, BreakingResult, CheckError};
use crate::model::Specification;
use crate::normalize::{OpenApiTransformer, TransformError, Transformer, load_document};
use crate::report::{ReportFormat, reporter_for};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs of a single run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub old_api_path: Option<PathBuf>,
    pub new_api_path: Option<PathBuf>,
    /// When set, the old API is the latest published artifact instead of `old_api_path`.
    pub maven: Option<ArtifactCoordinate>,
    pub config: BreakingConfig,
    pub format: ReportFormat,
}

/// A run failure, naming the stage it happened in.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("oldApiPath must be provided")]
    MissingOldApi,
    #[error("newApiPath must be provided")]
    MissingNewApi,
    #[error("failed to resolve old API artifact: {0}")]
    Resolve(#[source] ArtifactError),
    #[error("old API cannot be loaded from {}: {source}", path.display())]
    LoadOld {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
    #[error("new API cannot be loaded from {}: {source}", path.display())]
    LoadNew {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
    #[error("invalid breaking configuration: {0}")]
    Configure(#[source] CheckError),
    #[error("breaking change check failed: {0}")]
    Check(#[source] CheckError),
    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),
}

/// Run a check and write the report to `out`.
///
/// The returned result is the one that was reported; its exit status is given by
/// [`crate::report::exit_code`].
pub fn run(
    options: &Options,
    resolver: &dyn ArtifactResolver,
    out: &mut dyn Write,
) -> Result<BreakingResult, RunError> {
    // Keeps a downloaded artifact on disk until both documents are loaded.
    let resolved = match &options.maven {
        Some(coordinate) => Some(resolve_old_api(resolver, coordinate)?),
        None => None,
    };
    let old_api_path = match &resolved {
        Some(artifact) => artifact.path(),
        None => options
            .old_api_path
            .as_deref()
            .ok_or(RunError::MissingOldApi)?,
    };
    let new_api_path = options
        .new_api_path
        .as_deref()
        .ok_or(RunError::MissingNewApi)?;

    let checker = BreakChecker::from_config(&options.config).map_err(RunError::Configure)?;
    debug!(rules = ?checker.rule_ids(), "Configured breaking change rules");

    info!("Loading old API from {}", old_api_path.display());
    info!("Loading new API from {}", new_api_path.display());
    let old = load_specification(old_api_path).map_err(|source| RunError::LoadOld {
        path: old_api_path.to_path_buf(),
        source,
    })?;
    let new = load_specification(new_api_path).map_err(|source| RunError::LoadNew {
        path: new_api_path.to_path_buf(),
        source,
    })?;
    info!(
        old_operations = old.operation_count(),
        new_operations = new.operation_count(),
        "Successfully loaded APIs"
    );

    info!("Starting the check for breaking API changes");
    let result = checker.compare(&old, &new).map_err(RunError::Check)?;
    info!(
        breaking_changes = result.changes.len(),
        failed_rules = result.failed_rules.len(),
        "Check is finished"
    );

    reporter_for(options.format)
        .report(&result, out)
        .map_err(RunError::Report)?;
    Ok(result)
}

fn resolve_old_api(
    resolver: &dyn ArtifactResolver,
    coordinate: &ArtifactCoordinate,
) -> Result<ResolvedArtifact, RunError> {
    info!(
        artifact = %coordinate,
        repo = %coordinate.repo_url,
        "Resolving latest published old API"
    );
    let artifact = resolver.resolve(coordinate).map_err(RunError::Resolve)?;
    info!(version = %artifact.version, "Resolved old API artifact");
    Ok(artifact)
}

fn load_specification(path: &Path) -> Result<Specification, TransformError> {
    let document = load_document(path)?;
    OpenApiTransformer.transform(&document)
}
