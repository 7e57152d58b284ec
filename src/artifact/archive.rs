//! Reading the API description out of a downloaded jar.

use crate::artifact::ArtifactError;
use std::ffi::OsStr;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const DESCRIPTION_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Extract the first JSON or YAML entry of the jar at `jar` into `directory` and return the
/// extracted file's path. The file keeps the entry's name, so its extension still selects the
/// parser.
pub fn extract_api_document(
    jar: &Path,
    url: &str,
    directory: &Path,
) -> Result<PathBuf, ArtifactError> {
    let archive_error = |source: zip::result::ZipError| ArtifactError::Archive {
        url: url.to_string(),
        source,
    };
    let mut archive = zip::ZipArchive::new(File::open(jar)?).map_err(archive_error)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        if entry.is_dir() {
            continue;
        }
        // Entries escaping the archive root have no enclosed name and are never extracted.
        let Some(entry_path) = entry.enclosed_name() else {
            continue;
        };
        if !is_description(&entry_path) {
            continue;
        }
        let Some(file_name) = entry_path.file_name() else {
            continue;
        };

        let target = directory.join(file_name);
        debug!(entry = %entry_path.display(), "Extracting API description");
        io::copy(&mut entry, &mut File::create(&target)?)?;
        return Ok(target);
    }

    Err(ArtifactError::NoApiDocument(url.to_string()))
}

fn is_description(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            DESCRIPTION_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
