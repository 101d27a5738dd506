use crate::fixture::RecordingEntry;
use crate::store::StoreError;
use std::collections::HashMap;

/// The total, immutable mapping from fingerprint to recording.
///
/// Fingerprints are compared as exact opaque strings; there is no
/// normalization, partial matching, or defaulting. A lookup outside the
/// load-time set always fails.
#[derive(Debug, Clone)]
pub struct RecordingIndex {
    entries: HashMap<String, RecordingEntry>,
}

impl RecordingIndex {
    pub fn new(entries: Vec<RecordingEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.fingerprint.clone(), entry))
                .collect(),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Result<&RecordingEntry, StoreError> {
        self.entries
            .get(fingerprint)
            .ok_or_else(|| StoreError::RecordingNotFound {
                fingerprint: fingerprint.to_owned(),
            })
    }

    /// All loaded fingerprints in a stable sorted order.
    pub fn fingerprints(&self) -> Vec<&str> {
        let mut fingerprints: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        fingerprints.sort_unstable();
        fingerprints
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordingEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
