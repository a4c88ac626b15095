//! File-based draft store.
//!
//! [`FileDraftStore`] keeps each key in its own file directly under the root
//! directory:
//!
//! ```text
//! {root}/
//! +-- markdown-autosave   # JSON history written by AutosaveHistory
//! +-- ...
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::DraftStore;

/// [`DraftStore`] rooted at a directory on disk.
///
/// The directory is created lazily on the first write. I/O errors are logged
/// and never fatal.
#[derive(Clone, Debug)]
pub struct FileDraftStore {
    root: PathBuf,
}

impl FileDraftStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding the draft files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for `key`, or `None` if the key cannot name a file.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.starts_with(".tmp-");
        valid.then(|| self.root.join(key))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("failed to read draft {}: {e}", path.display());
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let Some(path) = self.entry_path(key) else {
            tracing::warn!("invalid draft key: {key:?}");
            return;
        };
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::warn!("failed to create draft directory: {e}");
            return;
        }

        let tmp = self.root.join(format!(".tmp-{key}"));
        if let Err(e) = fs::write(&tmp, value) {
            tracing::warn!("failed to write draft {}: {e}", tmp.display());
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            tracing::warn!("failed to replace draft {}: {e}", path.display());
            let _ = fs::remove_file(&tmp);
        }
    }
}
