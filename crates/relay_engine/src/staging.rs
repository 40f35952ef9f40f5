use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::persist::{ensure_dir, PersistError};
use crate::types::StagedFile;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging directory unusable: {0}")]
    Dir(String),
    #[error("staging io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for StagingError {
    fn from(err: PersistError) -> Self {
        StagingError::Dir(err.to_string())
    }
}

/// Owns the staging directory holding downloaded media pending publish.
///
/// Exactly one pipeline run owns this directory at a time; nothing here
/// guards against concurrent access.
#[derive(Debug, Clone)]
pub struct LocalStager {
    dir: PathBuf,
}

impl LocalStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if missing and probe writability.
    pub fn ensure(&self) -> Result<(), StagingError> {
        ensure_dir(&self.dir)?;
        Ok(())
    }

    /// True iff the directory holds no entries besides dotfiles. Leftovers
    /// from a crashed run make this false, which resumes publishing
    /// instead of re-fetching.
    pub fn is_empty(&self) -> Result<bool, StagingError> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !is_hidden(&entry.file_name()) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The publish batch: files with a recognized extension, in file-name
    /// order. Taken once at publishing entry; files appearing later in the
    /// directory are not picked up.
    pub fn snapshot(&self) -> Result<Vec<StagedFile>, StagingError> {
        Ok(self
            .visible_files()?
            .iter()
            .filter_map(|path| StagedFile::from_path(path))
            .collect())
    }

    /// Files needing format conversion before they can be published.
    pub fn pending_normalization(&self) -> Result<Vec<PathBuf>, StagingError> {
        Ok(self
            .visible_files()?
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"))
            })
            .collect())
    }

    /// Delete a staged file after its publish was confirmed. The publish is
    /// not undone when this fails; the caller decides how loud to be.
    pub fn remove(&self, path: &Path) -> Result<(), StagingError> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn visible_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(|entry| !is_hidden(&entry.file_name()))
            .map(|entry| entry.path())
            .collect();
        files.sort();
        Ok(files)
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
