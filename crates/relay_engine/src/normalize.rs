use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to convert {path}: {source}")]
    Convert {
        path: String,
        source: image::ImageError,
    },
    #[error("io error converting {path}: {source}")]
    Io { path: String, source: io::Error },
}

/// Convert a `.webp` staging entry into a publishable `.png`, deleting the
/// original. Files already in a supported format pass through untouched.
pub fn normalize(path: &Path) -> Result<PathBuf, NormalizeError> {
    let is_webp = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"));
    if !is_webp {
        return Ok(path.to_path_buf());
    }

    let display = path.display().to_string();
    let decoded = image::open(path).map_err(|source| NormalizeError::Convert {
        path: display.clone(),
        source,
    })?;

    let target = path.with_extension("png");
    decoded
        .save_with_format(&target, ImageFormat::Png)
        .map_err(|source| NormalizeError::Convert {
            path: display.clone(),
            source,
        })?;
    fs::remove_file(path).map_err(|source| NormalizeError::Io {
        path: display,
        source,
    })?;
    Ok(target)
}
