//! Maven2 repository layout: resolve the latest published build of an artifact and download it.

use crate::artifact::archive::extract_api_document;
use crate::artifact::metadata::{MavenMetadata, artifact_file_name, is_snapshot_version};
use crate::artifact::{ArtifactCoordinate, ArtifactError, ArtifactResolver, ResolvedArtifact};
use std::fs::File;
use std::io::{self, Read};
use tracing::{debug, info};

/// Fetches remote resources for the resolver.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Box<dyn Read>, ArtifactError>;
}

/// Blocking HTTP transport backed by `ureq`
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<Box<dyn Read>, ArtifactError> {
        let response = self.agent.get(url).call().map_err(|e| ArtifactError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}

/// Resolves artifacts laid out as `{repo}/{group/as/path}/{artifact}/{version}/...`
pub struct MavenResolver<T: Transport> {
    transport: T,
}

impl MavenResolver<UreqTransport> {
    pub fn over_http() -> Self {
        Self::new(UreqTransport::new())
    }
}

impl<T: Transport> MavenResolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn metadata(&self, directory_url: &str) -> Result<MavenMetadata, ArtifactError> {
        let url = format!("{directory_url}/maven-metadata.xml");
        debug!(url = %url, "Fetching maven metadata");

        let mut xml = String::new();
        self.transport
            .get(&url)?
            .read_to_string(&mut xml)
            .map_err(|e| ArtifactError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;
        MavenMetadata::from_xml(&xml).map_err(|source| ArtifactError::Metadata { url, source })
    }
}

impl<T: Transport> ArtifactResolver for MavenResolver<T> {
    fn resolve(&self, coordinate: &ArtifactCoordinate) -> Result<ResolvedArtifact, ArtifactError> {
        let base_url = coordinate.base_url();

        let version = self
            .metadata(&base_url)?
            .latest_version()
            .ok_or_else(|| ArtifactError::NoVersion(coordinate.to_string()))?;

        let file_name = if is_snapshot_version(&version) {
            let metadata = self.metadata(&format!("{base_url}/{version}"))?;
            let snapshot = metadata.snapshot().ok_or_else(|| ArtifactError::NoSnapshot {
                artifact: coordinate.to_string(),
                version: version.clone(),
            })?;
            artifact_file_name(&coordinate.artifact_id, &version, Some(snapshot))
        } else {
            artifact_file_name(&coordinate.artifact_id, &version, None)
        };

        let file_name = format!("{file_name}.{}", coordinate.extension);
        let url = format!("{base_url}/{version}/{file_name}");
        info!(artifact = %coordinate, version = %version, "Downloading {}", url);

        let directory = tempfile::tempdir()?;
        let download = directory.path().join(&file_name);
        let mut reader = self.transport.get(&url)?;
        io::copy(&mut reader, &mut File::create(&download)?)?;

        let path = if coordinate.extension.eq_ignore_ascii_case("jar") {
            extract_api_document(&download, &url, directory.path())?
        } else {
            download
        };
        Ok(ResolvedArtifact::new(version, url, path, directory))
    }
}
