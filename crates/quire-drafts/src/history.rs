//! Autosave history kept under a single draft key.
//!
//! The stored value is a JSON array, newest first:
//!
//! ```json
//! [{"unixTime": 1700000000000, "data": "# Draft"}]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DraftError, DraftStore};

/// Key under which the editor keeps its history.
pub const DEFAULT_KEY: &str = "markdown-autosave";

/// Maximum number of drafts retained.
pub const DEFAULT_CAPACITY: usize = 20;

/// Drafts of this many characters or fewer are not autosaved.
pub const DEFAULT_MIN_LENGTH: usize = 10;

const PREVIEW_THRESHOLD: usize = 25;
const PREVIEW_CHARS: usize = 20;

/// One autosaved draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosaveRecord {
    /// Save time in milliseconds since the Unix epoch.
    #[serde(rename = "unixTime")]
    pub unix_time: i64,
    /// Trimmed draft content.
    pub data: String,
}

impl AutosaveRecord {
    /// Save time, if the stored timestamp is representable.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.unix_time)
    }

    /// Short label for history listings.
    ///
    /// Drafts longer than 25 characters are cut to their first 20 followed by
    /// `...`.
    #[must_use]
    pub fn preview(&self) -> String {
        if self.data.chars().count() > PREVIEW_THRESHOLD {
            let head: String = self.data.chars().take(PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            self.data.clone()
        }
    }
}

/// Capped, deduplicated draft history over a [`DraftStore`].
#[derive(Debug)]
pub struct AutosaveHistory<S> {
    store: S,
    key: String,
    capacity: usize,
    min_length: usize,
}

impl<S: DraftStore> AutosaveHistory<S> {
    /// History under [`DEFAULT_KEY`] with default limits.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: DEFAULT_KEY.to_owned(),
            capacity: DEFAULT_CAPACITY,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Maximum number of drafts kept. Clamped to at least one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Length a trimmed draft must exceed before [`autosave`](Self::autosave)
    /// records it.
    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored drafts, newest first.
    ///
    /// A missing value reads as empty. A value that is not a JSON array is
    /// replaced with `[]`. Entries without a numeric `unixTime` and a string
    /// `data` are skipped.
    #[must_use]
    pub fn records(&self) -> Vec<AutosaveRecord> {
        let Some(raw) = self.store.get(&self.key) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
            Err(e) => {
                tracing::info!("resetting corrupt draft history {}: {e}", self.key);
                self.store.set(&self.key, "[]");
                Vec::new()
            }
        }
    }

    /// Record `data` as the newest draft.
    ///
    /// Whitespace is trimmed first; blank drafts and drafts already present in
    /// the history are ignored. When the history is full the oldest entries
    /// are dropped.
    pub fn push(&self, data: &str, time: DateTime<Utc>) -> Result<(), DraftError> {
        let data = data.trim();
        if data.is_empty() {
            return Ok(());
        }

        let mut records = self.records();
        records.truncate(self.capacity - 1);
        if records.iter().any(|record| record.data == data) {
            tracing::debug!("draft already in history, skipping");
            return Ok(());
        }

        records.insert(
            0,
            AutosaveRecord {
                unix_time: time.timestamp_millis(),
                data: data.to_owned(),
            },
        );
        let encoded = serde_json::to_string(&records)?;
        self.store.set(&self.key, &encoded);
        Ok(())
    }

    /// Editor autosave trigger.
    ///
    /// Pushes `data` only when its trimmed length exceeds the minimum length.
    /// Returns whether a push was attempted.
    pub fn autosave(&self, data: &str, time: DateTime<Utc>) -> Result<bool, DraftError> {
        if data.trim().chars().count() <= self.min_length {
            return Ok(false);
        }
        self.push(data, time)?;
        Ok(true)
    }
}
