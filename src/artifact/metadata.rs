//! `maven-metadata.xml` model and the snapshot file-name derivation.

use serde::Deserialize;

/// Root `<metadata>` element of a Maven2 repository metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MavenMetadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub versioning: Option<Versioning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Option<Versions>,
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Versions {
    #[serde(rename = "version", default)]
    pub version: Vec<String>,
}

/// The `<snapshot>` element of a version-level metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: String,
    pub build_number: String,
}

impl MavenMetadata {
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// The most recent published version: `latest`, then `release`, then the last listed one.
    pub fn latest_version(&self) -> Option<String> {
        let versioning = self.versioning.as_ref()?;
        [&versioning.latest, &versioning.release]
            .into_iter()
            .flatten()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .or_else(|| {
                versioning
                    .versions
                    .as_ref()?
                    .version
                    .iter()
                    .map(|v| v.trim())
                    .rfind(|v| !v.is_empty())
            })
            .map(str::to_string)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.versioning.as_ref()?.snapshot.as_ref()
    }
}

pub fn is_snapshot_version(version: &str) -> bool {
    version.ends_with("-SNAPSHOT")
}

/// File name (without extension) of an artifact build.
///
/// Snapshot builds are stored under a timestamped name: `1.2.0-SNAPSHOT` with timestamp
/// `20240101.120000` and build number `7` becomes `{artifact}-1.2.0-20240101.120000-7`.
/// Release versions, or snapshots without build metadata, keep `{artifact}-{version}`.
pub fn artifact_file_name(artifact_id: &str, version: &str, snapshot: Option<&Snapshot>) -> String {
    match snapshot {
        Some(snapshot) if is_snapshot_version(version) => {
            let timestamped = version.replace("SNAPSHOT", snapshot.timestamp.trim());
            format!(
                "{}-{}-{}",
                artifact_id,
                timestamped,
                snapshot.build_number.trim()
            )
        }
        _ => format!("{artifact_id}-{version}"),
    }
}
