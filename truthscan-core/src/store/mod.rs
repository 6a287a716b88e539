//! Single-file JSON record store.
//!
//! Keeps analysis history, user feedback, known hoaxes and users in one
//! JSON document. Every operation runs under a process-wide mutex keyed by
//! the document path and performs a full cycle: read the whole document,
//! mutate, write the whole document back. Two stores opened on the same file
//! share that mutex.
//!
//! - A document that cannot be read is replaced by the empty default (the
//!   store is not authoritative; this hides previous data rather than
//!   failing the caller).
//! - A write that fails is logged and otherwise ignored.
//! - There is no cross-process locking: two processes sharing a file race.
//!
//! Identifiers have the form `<kind>_<timestamp without separators>`.
//! Timestamps issued by a store are strictly increasing, so identifiers are
//! unique within each collection.

mod document;

pub use document::{Collection, Feedback, Record, Statistics, StoreDocument, StoreStats};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::error::{Result, TruthscanError};
use crate::fsutil;

/// Mutable state guarded by the store lock.
#[derive(Debug, Default)]
struct StoreState {
    last_issued: Option<DateTime<Utc>>,
}

type SharedState = Arc<Mutex<StoreState>>;

/// Lock registry, one entry per document path in this process.
static LOCKS: OnceLock<Mutex<HashMap<PathBuf, SharedState>>> = OnceLock::new();

/// The shared lock for `path`, keyed by its canonical form.
fn shared_state(path: &Path) -> SharedState {
    let key = canonical_key(path);
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(key).or_default())
}

/// Canonical parent joined with the file name; the file itself may not exist
/// yet. Falls back to the path as given when the parent cannot be resolved.
fn canonical_key(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match parent.canonicalize() {
        Ok(dir) => dir.join(name),
        Err(_) => path.to_path_buf(),
    }
}

/// JSON-file backed record store.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    state: SharedState,
}

impl RecordStore {
    /// Open the store at `path`, creating an empty document if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, path = %parent.display(), "Could not create data directory");
            }
        }

        let store = Self {
            state: shared_state(&path),
            path,
        };

        {
            let _guard = store.lock();
            if !store.path.exists() {
                info!(path = %store.path.display(), "Creating record store");
                store.write_document(&StoreDocument::default());
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========== ANALYSES ==========

    /// Append an analysis result. Returns the generated id.
    pub fn save_analysis<T: Serialize + ?Sized>(&self, analysis: &T) -> Result<String> {
        self.append(Collection::Analyses, analysis)
    }

    /// Most recent analyses, newest first.
    pub fn recent_analyses(&self, limit: usize) -> Vec<Record> {
        let mut analyses = self.read_locked().analyses;
        analyses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        analyses.truncate(limit);
        analyses
    }

    pub fn analysis_by_id(&self, id: &str) -> Option<Record> {
        self.read_locked().analyses.into_iter().find(|r| r.id == id)
    }

    // ========== FEEDBACK ==========

    /// Append user feedback. Returns the generated id.
    pub fn save_feedback<T: Serialize + ?Sized>(&self, feedback: &T) -> Result<String> {
        self.append(Collection::Feedback, feedback)
    }

    pub fn all_feedback(&self) -> Vec<Record> {
        self.read_locked().feedback
    }

    // ========== KNOWN HOAXES ==========

    /// Append a known hoax. Returns the generated id.
    pub fn add_known_hoax<T: Serialize + ?Sized>(&self, hoax: &T) -> Result<String> {
        self.append(Collection::KnownHoaxes, hoax)
    }

    pub fn known_hoaxes(&self) -> Vec<Record> {
        self.read_locked().known_hoaxes
    }

    // ========== USERS ==========

    /// Insert or replace a user.
    ///
    /// A string `id` field in `user` selects the record to replace; without
    /// one a new id is generated.
    pub fn save_user<T: Serialize + ?Sized>(&self, user: &T) -> Result<String> {
        let mut fields = to_fields(user)?;
        let supplied_id = match fields.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };
        fields.remove("timestamp");

        let mut state = self.lock();
        let mut doc = self.read_document();
        let timestamp = next_timestamp(&mut state, &doc.users);
        let id = supplied_id.unwrap_or_else(|| make_id(Collection::Users, &timestamp));

        let record = Record {
            id: id.clone(),
            timestamp: format_timestamp(&timestamp),
            fields,
        };

        match doc.users.iter_mut().find(|u| u.id == id) {
            Some(existing) => *existing = record,
            None => doc.users.push(record),
        }
        doc.refresh_statistics(&format_timestamp(&timestamp));

        self.write_document(&doc);
        info!(id = %id, "Saved user");
        Ok(id)
    }

    pub fn user_by_id(&self, id: &str) -> Option<Record> {
        self.read_locked().users.into_iter().find(|r| r.id == id)
    }

    // ========== STATISTICS ==========

    pub fn stats(&self) -> StoreStats {
        let doc = self.read_locked();
        StoreStats {
            total_analyses: doc.analyses.len(),
            total_feedback: doc.feedback.len(),
            total_known_hoaxes: doc.known_hoaxes.len(),
            total_users: doc.users.len(),
            last_updated: doc.statistics.last_updated,
            storage_file: self.path.display().to_string(),
        }
    }

    /// Reset every collection and counter.
    ///
    /// Fails with [`TruthscanError::ConfirmationRequired`] unless `confirm`
    /// is true; the stored data is untouched in that case. Unlike the other
    /// writes, a failure to write the empty document is returned.
    pub fn clear_all(&self, confirm: bool) -> Result<()> {
        if !confirm {
            warn!(path = %self.path.display(), "Refused to clear data without confirmation");
            return Err(TruthscanError::ConfirmationRequired);
        }

        let mut state = self.lock();
        warn!(path = %self.path.display(), "CLEARING ALL DATA");
        fsutil::write_atomic(&self.path, &fsutil::to_pretty_json(&StoreDocument::default())?)?;
        state.last_issued = None;
        Ok(())
    }

    // ========== INTERNALS ==========

    fn append<T: Serialize + ?Sized>(&self, collection: Collection, payload: &T) -> Result<String> {
        let mut fields = to_fields(payload)?;
        fields.remove("id");
        fields.remove("timestamp");

        let mut state = self.lock();
        let mut doc = self.read_document();
        let records = doc.collection_mut(collection);
        let timestamp = next_timestamp(&mut state, records);
        let id = make_id(collection, &timestamp);
        let formatted = format_timestamp(&timestamp);

        records.push(Record {
            id: id.clone(),
            timestamp: formatted.clone(),
            fields,
        });
        doc.refresh_statistics(&formatted);

        self.write_document(&doc);
        info!(id = %id, "Saved record");
        Ok(id)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read the document while holding the store lock.
    fn read_locked(&self) -> StoreDocument {
        let _guard = self.lock();
        self.read_document()
    }

    /// Read the whole document; the empty default on any failure.
    fn read_document(&self) -> StoreDocument {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "Error reading data file");
                return StoreDocument::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            error!(error = %e, path = %self.path.display(), "Error parsing data file");
            StoreDocument::default()
        })
    }

    /// Write the whole document; failures are logged only.
    fn write_document(&self, doc: &StoreDocument) {
        let result = fsutil::to_pretty_json(doc).and_then(|bytes| fsutil::write_atomic(&self.path, &bytes));
        if let Err(e) = result {
            error!(error = %e, path = %self.path.display(), "Error writing data file");
        }
    }
}

/// Convert a caller payload into record fields. Only JSON objects (or
/// `null`, meaning no fields) are accepted.
fn to_fields<T: Serialize + ?Sized>(payload: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(TruthscanError::SerializationError(format!(
            "record payload must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Next timestamp: now, but strictly after anything this store issued and
/// anything already in `existing`.
fn next_timestamp(state: &mut StoreState, existing: &[Record]) -> DateTime<Utc> {
    let tick = Duration::microseconds(1);
    let mut timestamp = Utc::now().trunc_subsecs(6);

    let newest_existing = existing
        .iter()
        .filter_map(|r| DateTime::parse_from_rfc3339(&r.timestamp).ok())
        .map(|t| t.with_timezone(&Utc))
        .max();

    for floor in [state.last_issued, newest_existing].into_iter().flatten() {
        if timestamp <= floor {
            timestamp = floor + tick;
        }
    }

    state.last_issued = Some(timestamp);
    timestamp
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn make_id(collection: Collection, timestamp: &DateTime<Utc>) -> String {
    let compact: String = format_timestamp(timestamp)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}_{}", collection.id_prefix(), compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_temp() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("truthscan_data.json"));
        (dir, store)
    }

    #[test]
    fn test_open_creates_default_document() {
        let (_dir, store) = open_temp();
        assert!(store.path().exists());
        let stats = store.stats();
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.total_users, 0);
        assert!(stats.last_updated.is_none());
    }

    #[test]
    fn test_id_format() {
        let ts = DateTime::parse_from_rfc3339("2026-10-18T09:05:03.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&ts), "2026-10-18T09:05:03.123456Z");
        assert_eq!(make_id(Collection::Analyses, &ts), "analysis_20261018T090503123456Z");
        assert_eq!(make_id(Collection::Feedback, &ts), "fb_20261018T090503123456Z");
    }

    #[test]
    fn test_save_analysis_counts() {
        let (_dir, store) = open_temp();
        for i in 0..4 {
            store
                .save_analysis(&json!({"content": format!("claim {i}"), "verdict": "FAKE"}))
                .unwrap();
        }
        assert_eq!(store.stats().total_analyses, 4);

        let raw: StoreDocument =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw.statistics.total_analyses, 4);
        assert!(raw.statistics.last_updated.is_some());
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let (_dir, store) = open_temp();
        let ids: Vec<String> = (0..20)
            .map(|_| store.save_analysis(&json!({})).unwrap())
            .collect();

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn test_recent_analyses_newest_first() {
        let (_dir, store) = open_temp();
        let ids: Vec<String> = (0..5)
            .map(|i| store.save_analysis(&json!({ "n": i })).unwrap())
            .collect();

        let recent = store.recent_analyses(3);
        let recent_ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(recent_ids, vec![ids[4].as_str(), ids[3].as_str(), ids[2].as_str()]);
        assert_eq!(recent[0].get("n").unwrap(), 4);
    }

    #[test]
    fn test_analysis_by_id() {
        let (_dir, store) = open_temp();
        let id = store.save_analysis(&json!({"verdict": "REAL"})).unwrap();
        let record = store.analysis_by_id(&id).unwrap();
        assert_eq!(record.get("verdict").unwrap(), "REAL");
        assert!(store.analysis_by_id("analysis_missing").is_none());
    }

    #[test]
    fn test_payload_id_and_timestamp_are_ignored() {
        let (_dir, store) = open_temp();
        let id = store
            .save_analysis(&json!({"id": "mine", "timestamp": "yesterday"}))
            .unwrap();
        assert!(id.starts_with("analysis_"));
        let record = store.analysis_by_id(&id).unwrap();
        assert_ne!(record.timestamp, "yesterday");
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let (_dir, store) = open_temp();
        assert!(store.save_analysis(&json!([1, 2, 3])).is_err());
        assert!(store.save_feedback("just text").is_err());
        assert_eq!(store.stats().total_analyses, 0);
    }

    #[test]
    fn test_feedback_roundtrip() {
        let (_dir, store) = open_temp();
        let id = store
            .save_feedback(&Feedback {
                analysis_id: "analysis_1".into(),
                is_correct: false,
                comment: Some("satire, not a hoax".into()),
            })
            .unwrap();
        assert!(id.starts_with("fb_"));

        let all = store.all_feedback();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("analysisId").unwrap(), "analysis_1");
        assert_eq!(all[0].get("isCorrect").unwrap(), false);
        assert_eq!(store.stats().total_feedback, 1);
    }

    #[test]
    fn test_known_hoaxes() {
        let (_dir, store) = open_temp();
        store
            .add_known_hoax(&json!({"text": "Moon landing was faked", "verdict": "FAKE"}))
            .unwrap();
        let hoaxes = store.known_hoaxes();
        assert_eq!(hoaxes.len(), 1);
        assert!(hoaxes[0].id.starts_with("hoax_"));
        assert_eq!(store.stats().total_known_hoaxes, 1);
    }

    #[test]
    fn test_save_user_upserts_by_id() {
        let (_dir, store) = open_temp();
        let id = store.save_user(&json!({"id": "user_42", "name": "Ada"})).unwrap();
        assert_eq!(id, "user_42");
        store.save_user(&json!({"id": "user_42", "name": "Ada L."})).unwrap();

        assert_eq!(store.stats().total_users, 1);
        let user = store.user_by_id("user_42").unwrap();
        assert_eq!(user.get("name").unwrap(), "Ada L.");
    }

    #[test]
    fn test_save_user_generates_id() {
        let (_dir, store) = open_temp();
        let id = store.save_user(&json!({"name": "anon"})).unwrap();
        assert!(id.starts_with("user_"));
        assert!(store.user_by_id(&id).is_some());
    }

    #[test]
    fn test_clear_all_requires_confirmation() {
        let (_dir, store) = open_temp();
        store.save_analysis(&json!({"verdict": "FAKE"})).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let err = store.clear_all(false).unwrap_err();
        assert!(matches!(err, TruthscanError::ConfirmationRequired));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert_eq!(store.stats().total_analyses, 1);
    }

    #[test]
    fn test_clear_all_with_confirmation() {
        let (_dir, store) = open_temp();
        store.save_analysis(&json!({})).unwrap();
        store.save_feedback(&json!({})).unwrap();
        store.add_known_hoax(&json!({})).unwrap();
        store.save_user(&json!({})).unwrap();

        store.clear_all(true).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.total_feedback, 0);
        assert_eq!(stats.total_known_hoaxes, 0);
        assert_eq!(stats.total_users, 0);

        let raw: StoreDocument =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, StoreDocument::default());
    }

    #[test]
    fn test_corrupt_document_reads_as_empty() {
        let (_dir, store) = open_temp();
        std::fs::write(store.path(), b"{ not json").unwrap();
        assert_eq!(store.stats().total_analyses, 0);

        store.save_analysis(&json!({"ok": true})).unwrap();
        assert_eq!(store.stats().total_analyses, 1);
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let (_dir, store) = open_temp();
        store.save_analysis(&json!({"content": "Ñandú"})).unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"analyses\""));
        assert!(text.contains("Ñandú"));
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let (_dir, store) = open_temp();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        store.save_analysis(&json!({"thread": t, "i": i})).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.stats().total_analyses, 20);
        let mut ids: Vec<String> = store.recent_analyses(100).into_iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_stores_on_one_file_share_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truthscan_data.json");
        let first = std::sync::Arc::new(RecordStore::open(&path));
        let second = std::sync::Arc::new(RecordStore::open(dir.path().join(".").join("truthscan_data.json")));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = if t % 2 == 0 {
                    std::sync::Arc::clone(&first)
                } else {
                    std::sync::Arc::clone(&second)
                };
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.save_analysis(&json!({"thread": t, "i": i})).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = RecordStore::open(&path);
        assert_eq!(reopened.stats().total_analyses, 200);
        let mut ids: Vec<String> = reopened.recent_analyses(500).into_iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_canonical_key_resolves_dot_segments() {
        let dir = tempfile::tempdir().unwrap();
        let plain = canonical_key(&dir.path().join("data.json"));
        let dotted = canonical_key(&dir.path().join(".").join("data.json"));
        assert_eq!(plain, dotted);
    }
}
