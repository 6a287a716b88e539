//! Registry of known manipulated-image fingerprints.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::hashing::hamming_distance;
use crate::error::Result;

/// A registered fingerprint of a known manipulated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintEntry {
    /// Lower-case hex perceptual hash
    pub hash_value: String,
    pub description: String,
    pub source: String,
}

impl FingerprintEntry {
    pub fn new(
        hash_value: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            hash_value: hash_value.into(),
            description: description.into(),
            source: source.into(),
        }
    }
}

/// Known fingerprints keyed by hash string.
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
    entries: HashMap<String, FingerprintEntry>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = FingerprintEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.register(entry);
        }
        store
    }

    /// Load a JSON array of [`FingerprintEntry`] objects.
    pub fn load_json(path: &Path) -> Result<Self> {
        let entries: Vec<FingerprintEntry> = serde_json::from_slice(&std::fs::read(path)?)?;
        let store = Self::from_entries(entries);
        info!(path = %path.display(), count = store.len(), "Loaded known fingerprints");
        Ok(store)
    }

    /// Add or replace a fingerprint. Hash values are normalised to
    /// lower-case so hex from any source compares equal.
    pub fn register(&mut self, mut entry: FingerprintEntry) {
        entry.hash_value = normalize(&entry.hash_value);
        self.entries.insert(entry.hash_value.clone(), entry);
    }

    /// Exact lookup by hash string.
    pub fn lookup(&self, hash_value: &str) -> Option<&FingerprintEntry> {
        self.entries.get(&normalize(hash_value))
    }

    /// Entries whose hash lies within `max_distance` bits of `hash_value`,
    /// nearest first. Non-hex values on either side never match.
    pub fn near_matches(&self, hash_value: &str, max_distance: u32) -> Vec<(&FingerprintEntry, u32)> {
        let Ok(query) = hex::decode(normalize(hash_value)) else {
            return Vec::new();
        };

        let mut matches: Vec<(&FingerprintEntry, u32)> = self
            .entries
            .values()
            .filter_map(|entry| {
                let candidate = hex::decode(&entry.hash_value).ok()?;
                let distance = hamming_distance(&query, &candidate)?;
                (distance <= max_distance).then_some((entry, distance))
            })
            .collect();

        matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.hash_value.cmp(&b.0.hash_value)));
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FingerprintEntry> {
        self.entries.values()
    }
}

fn normalize(hash_value: &str) -> String {
    hash_value.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FingerprintStore {
        FingerprintStore::from_entries([
            FingerprintEntry::new("ffff0000ffff0000", "Known deepfake", "factcheck.example"),
            FingerprintEntry::new("0123456789ABCDEF", "Doctored protest photo", "newsroom"),
        ])
    }

    #[test]
    fn test_exact_lookup() {
        let store = store();
        assert_eq!(
            store.lookup("ffff0000ffff0000").unwrap().description,
            "Known deepfake"
        );
        assert!(store.lookup("ffff0000ffff0001").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let store = store();
        assert!(store.lookup("0123456789abcdef").is_some());
        assert!(store.lookup("FFFF0000FFFF0000").is_some());
    }

    #[test]
    fn test_register_replaces_same_hash() {
        let mut store = store();
        store.register(FingerprintEntry::new("FFFF0000FFFF0000", "Updated", "x"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("ffff0000ffff0000").unwrap().description, "Updated");
    }

    #[test]
    fn test_near_matches_within_distance() {
        let store = store();
        // two bits away from the first entry
        let matches = store.near_matches("ffff0000ffff0003", 2);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.description, "Known deepfake");
        assert_eq!(matches[0].1, 2);

        assert!(store.near_matches("ffff0000ffff0003", 1).is_empty());
    }

    #[test]
    fn test_near_matches_ignores_non_hex() {
        let mut store = store();
        store.register(FingerprintEntry::new("not-hex", "bad", "x"));
        assert!(store.near_matches("zz", 64).is_empty());
        assert_eq!(store.near_matches("ffff0000ffff0000", 0).len(), 1);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");
        std::fs::write(
            &path,
            r#"[{"hashValue": "00000000000000ff", "description": "Viral fake", "source": "afp"}]"#,
        )
        .unwrap();

        let store = FingerprintStore::load_json(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("00000000000000FF").unwrap().source, "afp");
    }
}
