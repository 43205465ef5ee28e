use crate::foundation::clock::Clock;
use crate::foundation::error::{EaselResult, StoreError};
use crate::raster::image::RasterImage;
use crate::store::kv::{KvStore, user_key};

/// Default number of records kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

const HISTORY_KEY: &str = "history";

/// Which tool produced a history record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Outpaint / canvas expansion.
    Outpaint,
    /// One turntable angle.
    Turntable,
    /// Masked edit (pose, face, background).
    Edit,
    /// Video clip.
    Video,
}

/// One persisted generation result.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Unique id within the log.
    pub id: String,
    /// Content key of the result image (see [`RasterImage::fingerprint`]).
    pub image_key: String,
    /// Producing tool.
    pub kind: GenerationKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Starred by the user.
    #[serde(default)]
    pub is_favorite: bool,
    /// Instruction text sent with the request.
    pub prompt: String,
    /// Free-form label such as the outpaint direction.
    #[serde(default)]
    pub details: Option<String>,
    /// Content keys of the input images.
    #[serde(default)]
    pub input_keys: Vec<String>,
}

/// Unsaved record contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Content key of the result image.
    pub image_key: String,
    /// Producing tool.
    pub kind: GenerationKind,
    /// Instruction text.
    pub prompt: String,
    /// Optional detail label.
    pub details: Option<String>,
    /// Input image keys.
    pub input_keys: Vec<String>,
}

impl HistoryEntry {
    /// Entry for `result`.
    pub fn new(kind: GenerationKind, result: &RasterImage, prompt: impl Into<String>) -> Self {
        Self {
            image_key: result.fingerprint(),
            kind,
            prompt: prompt.into(),
            details: None,
            input_keys: Vec::new(),
        }
    }

    /// Attach a detail label.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach input images.
    pub fn with_inputs(mut self, inputs: &[&RasterImage]) -> Self {
        self.input_keys = inputs.iter().map(|i| i.fingerprint()).collect();
        self
    }
}

/// Result of a best-effort [`HistoryLog::save`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Everything was written.
    Saved {
        /// Records written.
        records: usize,
    },
    /// The store was full; the log was cut to half capacity before writing.
    SavedAfterPrune {
        /// Records written.
        records: usize,
        /// Records dropped by the emergency prune.
        dropped: usize,
    },
    /// Nothing was written; the in-memory log is unchanged apart from any prune.
    Failed,
}

/// Capped generation history, newest first.
///
/// Writes are best-effort: concurrent tools may race on the same stored key and the last writer
/// wins.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    capacity: usize,
    records: Vec<HistoryRecord>,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    /// Empty log keeping at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Vec::new(),
        }
    }

    /// Load the log stored for `user`. Unparseable data is discarded with a warning.
    pub fn load(store: &dyn KvStore, user: &str, capacity: usize) -> EaselResult<Self> {
        let mut log = Self::new(capacity);
        let Some(raw) = store.get(&user_key(user, HISTORY_KEY))? else {
            return Ok(log);
        };
        match serde_json::from_str::<Vec<HistoryRecord>>(&raw) {
            Ok(mut records) => {
                records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
                records.truncate(log.capacity);
                log.records = records;
            }
            Err(e) => tracing::warn!(error = %e, user, "discarding unreadable history"),
        }
        Ok(log)
    }

    /// Maximum number of records kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records, newest first.
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record.
    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Add a record stamped with `clock`, pruning the oldest past capacity. Returns the new id.
    pub fn add(&mut self, entry: HistoryEntry, clock: &dyn Clock) -> String {
        let timestamp_ms = clock.now_ms();
        let mut seq = self.records.len() as u64;
        let id = loop {
            let candidate = format!("{timestamp_ms:x}-{seq}");
            if self.get(&candidate).is_none() {
                break candidate;
            }
            seq += 1;
        };

        self.records.insert(
            0,
            HistoryRecord {
                id: id.clone(),
                image_key: entry.image_key,
                kind: entry.kind,
                timestamp_ms,
                is_favorite: false,
                prompt: entry.prompt,
                details: entry.details,
                input_keys: entry.input_keys,
            },
        );
        while self.records.len() > self.capacity {
            self.drop_oldest();
        }
        id
    }

    /// Flip the favourite flag. Returns the new value, or `None` for an unknown id.
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        let r = self.records.iter_mut().find(|r| r.id == id)?;
        r.is_favorite = !r.is_favorite;
        Some(r.is_favorite)
    }

    /// Delete a record. Returns `false` for an unknown id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// Delete every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Write the log for `user`.
    ///
    /// When the store reports its quota exceeded, the log is cut to the newest half of its
    /// capacity and written once more. Failures are logged and reported, never raised.
    pub fn save(&mut self, store: &mut dyn KvStore, user: &str) -> SaveOutcome {
        let key = user_key(user, HISTORY_KEY);
        match self.write(store, &key) {
            Ok(()) => {
                return SaveOutcome::Saved {
                    records: self.records.len(),
                };
            }
            Err(StoreError::QuotaExceeded { .. }) => {}
            Err(e) => {
                tracing::warn!(error = %e, user, "history write failed");
                return SaveOutcome::Failed;
            }
        }

        let keep = (self.capacity / 2).max(1);
        let dropped = self.records.len().saturating_sub(keep);
        self.records.truncate(keep);
        tracing::warn!(dropped, keep, user, "history quota exceeded, pruned");

        match self.write(store, &key) {
            Ok(()) => SaveOutcome::SavedAfterPrune {
                records: self.records.len(),
                dropped,
            },
            Err(e) => {
                tracing::warn!(error = %e, user, "history write failed after prune");
                SaveOutcome::Failed
            }
        }
    }

    fn write(&self, store: &mut dyn KvStore, key: &str) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| StoreError::Backend(format!("serialize history: {e}")))?;
        store.set(key, &json)
    }

    fn drop_oldest(&mut self) {
        // Ties go to the record inserted earliest (highest index).
        let mut oldest = 0;
        for (i, r) in self.records.iter().enumerate() {
            if r.timestamp_ms <= self.records[oldest].timestamp_ms {
                oldest = i;
            }
        }
        self.records.remove(oldest);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/log.rs"]
mod tests;
