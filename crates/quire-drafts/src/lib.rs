//! Draft autosave storage for the quire editor.
//!
//! The editor persists snapshots of its content so that work survives a
//! closed tab or a crash. Storage is split in two layers:
//!
//! - [`DraftStore`]: string key-value area, the only thing a backend provides
//! - [`AutosaveHistory`]: capped, deduplicated, newest-first history of drafts
//!   kept as a JSON array under a single key
//!
//! # Implementations
//!
//! - [`MemoryDraftStore`]: in-process map, used by tests and one-shot tools
//! - [`FileDraftStore`]: one file per key under a root directory
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use quire_drafts::{AutosaveHistory, MemoryDraftStore};
//!
//! let history = AutosaveHistory::new(MemoryDraftStore::new());
//! let time = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
//!
//! history.push("  # My post  ", time).unwrap();
//! let records = history.records();
//! assert_eq!(records[0].data, "# My post");
//! assert_eq!(records[0].unix_time, 1_700_000_000_000);
//! ```

mod file;
mod history;
mod memory;

pub use file::FileDraftStore;
pub use history::{
    AutosaveHistory, AutosaveRecord, DEFAULT_CAPACITY, DEFAULT_KEY, DEFAULT_MIN_LENGTH,
};
pub use memory::MemoryDraftStore;

/// Errors raised while writing draft history.
///
/// Reads never fail: missing or corrupt history is treated as empty.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// History could not be encoded as JSON.
    #[error("Failed to encode draft history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent string key-value area backing the draft history.
///
/// Backends swallow their own I/O failures: a failed `set` is logged and
/// dropped, a failed `get` reads as missing. Losing an autosave must never
/// interrupt editing.
pub trait DraftStore: Send + Sync {
    /// Retrieve the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
}

impl<S: DraftStore + ?Sized> DraftStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}

impl<S: DraftStore + ?Sized> DraftStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}
