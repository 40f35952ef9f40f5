use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use relay_logging::{relay_info, relay_warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::persist::{atomic_write, PersistError};

/// Bump when the blob layout changes; older blobs are discarded and the
/// source goes through a fresh login.
pub const SESSION_BLOB_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    version: u32,
    source: String,
    saved_utc: String,
    state: Value,
}

/// Persists opaque per-source auth state between runs, so interactive
/// logins only happen once.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn blob_path(&self, source: &str) -> PathBuf {
        self.dir
            .join(format!(".relay_auth_{}.json", short_hash(source)))
    }

    /// Load the persisted state for a source. A missing file is a normal
    /// first run; a damaged or out-of-version blob is discarded with a
    /// warning, forcing a fresh login.
    pub fn load(&self, source: &str) -> Option<Value> {
        let path = self.blob_path(source);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                relay_warn!("failed to read session blob {:?}: {}", path, err);
                return None;
            }
        };

        let blob: PersistedSession = match serde_json::from_str(&content) {
            Ok(blob) => blob,
            Err(err) => {
                relay_warn!("failed to parse session blob {:?}: {}", path, err);
                return None;
            }
        };
        if blob.version != SESSION_BLOB_VERSION {
            relay_warn!(
                "discarding session blob for {source} with version {}",
                blob.version
            );
            return None;
        }
        if blob.source != source {
            relay_warn!("session blob {:?} belongs to {}", path, blob.source);
            return None;
        }

        relay_info!("restored session state for {source} (saved {})", blob.saved_utc);
        Some(blob.state)
    }

    pub fn save(&self, source: &str, state: &Value) -> Result<(), PersistError> {
        let blob = PersistedSession {
            version: SESSION_BLOB_VERSION,
            source: source.to_string(),
            saved_utc: Utc::now().to_rfc3339(),
            state: state.clone(),
        };
        let content = serde_json::to_string_pretty(&blob)
            .map_err(|err| PersistError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        atomic_write(&self.blob_path(source), &content)
    }
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
