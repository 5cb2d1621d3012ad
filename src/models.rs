use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name extension the engine accepts for model files.
pub const MODEL_EXTENSION: &str = ".bin";

/// A named filesystem entry: display name plus full path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedPath {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("model directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Lists the immediate children of `dir`. Entries whose names are not valid
/// UTF-8 are skipped.
pub fn list(dir: &Path) -> Result<Vec<NamedPath>, ScanError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| ScanError::DirectoryUnavailable(format!("{}: {err}", dir.display())))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|err| ScanError::DirectoryUnavailable(format!("{}: {err}", dir.display())))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        found.push(NamedPath {
            name,
            path: entry.path(),
        });
    }
    Ok(found)
}

/// Keeps only entries with the recognized model extension. Pure, never fails.
pub fn filter_models(entries: &[NamedPath]) -> Vec<NamedPath> {
    entries
        .iter()
        .filter(|entry| entry.name.ends_with(MODEL_EXTENSION))
        .cloned()
        .collect()
}

/// Recognized models under `dir`, sorted lexicographically by name so that
/// selection downstream is deterministic across file systems. An unavailable
/// directory degrades to an empty listing.
pub fn scan(dir: &Path) -> Vec<NamedPath> {
    let entries = match list(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "model scan failed");
            return Vec::new();
        }
    };
    let mut models = filter_models(&entries);
    models.sort_by(|a, b| a.name.cmp(&b.name));
    models
}
