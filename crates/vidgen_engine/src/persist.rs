use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("parent directory unusable for {path}: {reason}")]
    ParentDir { path: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates the directory that will hold `path`, returning it.
pub fn ensure_parent_dir(path: &Path) -> Result<&Path, PersistError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let unusable = |reason: String| PersistError::ParentDir {
        path: path.display().to_string(),
        reason,
    };

    if parent.exists() {
        if !parent.is_dir() {
            return Err(unusable("not a directory".to_string()));
        }
    } else {
        fs::create_dir_all(parent).map_err(|err| unusable(err.to_string()))?;
    }
    Ok(parent)
}

/// Replaces `path` with `contents` via a synced temp file in the same directory,
/// so readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistError> {
    let parent = ensure_parent_dir(path)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}

/// Reads `path`, treating a missing file as `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, PersistError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
