//! Archive extraction and manifest reading.
//!
//! Uploads are gzip-compressed tar archives with a single top-level
//! directory. Extraction strips that leading component so the manifest and
//! readme land at the staging-directory root.

use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{AppError, Result};
use crate::models::manifest::Manifest;

/// Unpack a gzip-compressed tar archive into `dest_dir`.
///
/// The first path component of every entry is stripped; entries that consist
/// of only the top-level directory are skipped.
pub fn extract_tar_gz(data: &[u8], dest_dir: &Path) -> Result<()> {
    let decoder = GzDecoder::new(data);
    let mut archive = Archive::new(decoder);

    let entries = archive
        .entries()
        .map_err(|e| AppError::Extraction(format!("Failed to read archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| AppError::Extraction(format!("Malformed archive entry: {}", e)))?;

        let path = entry
            .path()
            .map_err(|e| AppError::Extraction(format!("Invalid entry path: {}", e)))?
            .into_owned();

        let Some(stripped) = strip_leading_component(&path)? else {
            continue;
        };

        let target = dest_dir.join(stripped);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&target)
            .map_err(|e| AppError::Extraction(format!("Failed to unpack {}: {}", path.display(), e)))?;
    }

    Ok(())
}

/// Drop the first path component, rejecting any path that tries to escape
/// the destination directory.
fn strip_leading_component(path: &Path) -> Result<Option<PathBuf>> {
    let mut components = path.components();
    components.next();

    let mut stripped = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {}
            _ => {
                return Err(AppError::Extraction(format!(
                    "Archive entry escapes destination: {}",
                    path.display()
                )))
            }
        }
    }

    if stripped.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(stripped))
    }
}

/// Parse the manifest file at `path`.
pub fn parse_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::ManifestParse(format!("Failed to read {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| AppError::ManifestParse(format!("Malformed manifest: {}", e)))
}

/// Read a text file that may legitimately be absent (e.g. README.md).
///
/// Returns `None` when the file does not exist; other I/O faults propagate.
pub fn read_optional_text(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Sanity-check that the payload begins with the gzip magic bytes.
pub fn looks_like_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}
