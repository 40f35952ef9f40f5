use std::path::{Path, PathBuf};

/// The single extension routed to the video upload endpoint.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Extensions routed to the image upload endpoint.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a file extension into an upload route.
///
/// Anything outside the fixed sets is excluded from the publish batch.
pub fn classify_extension(ext: &str) -> Option<MediaKind> {
    let ext = ext.to_ascii_lowercase();
    if ext == VIDEO_EXTENSION {
        return Some(MediaKind::Video);
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaKind::Image);
    }
    None
}

/// A downloaded media file sitting in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl StagedFile {
    /// Build from a path when its extension maps to an upload route.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        let kind = classify_extension(ext)?;
        Some(Self {
            path: path.to_path_buf(),
            kind,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Durable reference returned by a successful upload.
///
/// `deletehash` is the only capability for later album association or
/// remote deletion; it never expires on the hosting side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub link: String,
    pub deletehash: String,
    pub remote_id: String,
}

/// Reference to a remote collection of uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumHandle {
    pub remote_id: String,
    pub deletehash: String,
    pub link: String,
}
