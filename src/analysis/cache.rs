use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::Prediction;

/// Predictions memoized by match signature.
///
/// Entries are never refreshed when the learning model changes; only
/// [`AnalysisCache::clear`] drops them.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<String, Prediction>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached prediction for `signature`, computing it on a miss.
    /// The flag is true on a cache hit.
    pub fn get_or_compute<F>(&mut self, signature: &str, compute: F) -> (Prediction, bool)
    where
        F: FnOnce() -> Prediction,
    {
        match self.entries.entry(signature.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => (entry.insert(compute()).clone(), false),
        }
    }

    pub fn get(&self, signature: &str) -> Option<&Prediction> {
        self.entries.get(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
