//! Retrieval of a previously published API specification from an artifact repository.
//!
//! Used when the old API is not available as a local file: the resolver locates the latest
//! published version of an artifact, downloads it into a temporary directory and hands back
//! the local path. Jar artifacts are unpacked first and the path of the API description found
//! inside is returned instead.

pub mod archive;
pub mod maven;
pub mod metadata;

pub use maven::{MavenResolver, Transport, UreqTransport};
pub use metadata::{MavenMetadata, Snapshot, artifact_file_name};

use std::fmt;
use std::path::{Path, PathBuf};

/// Repository location plus artifact identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinate {
    pub repo_url: String,
    pub group_id: String,
    pub artifact_id: String,
    /// File extension of the published artifact; `jar` artifacts carry the description inside
    pub extension: String,
}

impl ArtifactCoordinate {
    pub fn new(
        repo_url: impl Into<String>,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: "jar".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// `{repo}/{group/as/path}/{artifact}`
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.repo_url.trim_end_matches('/'),
            self.group_id.replace('.', "/"),
            self.artifact_id
        )
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("could not fetch {url}: {message}")]
    Http { url: String, message: String },
    #[error("invalid maven metadata at {url}: {source}")]
    Metadata {
        url: String,
        #[source]
        source: quick_xml::DeError,
    },
    #[error("no published version found for {0}")]
    NoVersion(String),
    #[error("no snapshot build recorded for {artifact} {version}")]
    NoSnapshot { artifact: String, version: String },
    #[error("invalid jar at {url}: {source}")]
    Archive {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("no JSON or YAML API description inside {0}")]
    NoApiDocument(String),
    #[error("could not store downloaded artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloaded artifact. The temporary directory holding it lives as long as this value.
#[derive(Debug)]
pub struct ResolvedArtifact {
    pub version: String,
    pub url: String,
    path: PathBuf,
    _directory: tempfile::TempDir,
}

impl ResolvedArtifact {
    pub fn new(version: String, url: String, path: PathBuf, directory: tempfile::TempDir) -> Self {
        Self {
            version,
            url,
            path,
            _directory: directory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Locates and downloads the latest published build of an artifact.
pub trait ArtifactResolver {
    fn resolve(&self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact, ArtifactError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let coordinate =
            ArtifactCoordinate::new("https://repo.example.com/", "com.example.api", "user-api");
        assert_eq!(
            coordinate.base_url(),
            "https://repo.example.com/com/example/api/user-api"
        );
        assert_eq!(coordinate.to_string(), "com.example.api:user-api");
        assert_eq!(coordinate.extension, "jar");
        assert_eq!(coordinate.with_extension("yaml").extension, "yaml");
    }
}
