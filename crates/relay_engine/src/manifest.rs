use std::path::Path;

use crate::persist::{atomic_write, PersistError};

/// Write the link manifest: one public link per line, replacing whatever a
/// previous run left behind.
pub fn write_manifest(path: &Path, links: &[String]) -> Result<(), PersistError> {
    let content = if links.is_empty() {
        String::new()
    } else {
        let mut joined = links.join("\n");
        joined.push('\n');
        joined
    };
    atomic_write(path, &content)
}
