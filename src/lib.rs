pub mod artifact;
pub mod compat;
pub mod model;
pub mod normalize;
pub mod report;
pub mod runner;
pub mod spec;

pub use model::Specification;
pub use spec::{ApiSpec, Compatibility};

use anyhow::Context;
use sha2::{Digest, Sha256};

/// Generates a semantic fingerprint for a normalized API specification.
///
/// The fingerprint is a SHA-256 hash of the specification's canonical JSON form. Operations
/// and named schemas are serialized in key order and descriptions are skipped, so the hash is
/// insensitive to formatting, key order and documentation-only edits of the source document.
///
/// # Returns
///
/// A `Result` containing the hex-encoded SHA-256 fingerprint string,
/// or an error if serialization fails.
pub fn generate_fingerprint(specification: &Specification) -> anyhow::Result<String> {
    let json_string = serde_json::to_string_pretty(specification)
        .context("Failed to serialize canonical representation to JSON")?;

    let mut hasher = Sha256::new();
    hasher.update(json_string.as_bytes());
    let hash_result = hasher.finalize();

    Ok(format!("{:x}", hash_result))
}
