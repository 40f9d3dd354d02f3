//! Per-concrete-version cache for resolved assumption tables.
//!
//! Mirrors the hit/miss/revalidation bookkeeping pattern used for
//! reserve roll-forward caching, but keyed by `(name, version)` and with
//! single-flight semantics: at most one build runs per key even under
//! concurrent resolution.

use crate::error::{LiveCalcError, LiveCalcResult};
use crate::resolver::ResolvedTable;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

type CacheKey = (String, String);
// Errors are stored as plain strings rather than `LiveCalcError` so the
// cached slot can be cloned out to every waiting caller.
type CacheSlot = std::sync::Arc<OnceLock<Result<ResolvedTable, String>>>;

/// Caches resolved tables for concrete (immutable) versions only. `latest`
/// and `draft` are never stored here; callers must not pass them in.
#[derive(Default)]
pub struct VersionCache {
    entries: Mutex<HashMap<CacheKey, CacheSlot>>,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `(name, version)`, building it with
    /// `build` on first access. Concurrent callers for the same key block
    /// on the same build rather than racing duplicate builds.
    pub fn get_or_build(
        &self,
        name: &str,
        version: &str,
        build: impl FnOnce() -> LiveCalcResult<ResolvedTable>,
    ) -> LiveCalcResult<ResolvedTable>
    where
        ResolvedTable: Clone,
    {
        let key = (name.to_string(), version.to_string());

        let slot = {
            let mut entries = self.entries.lock().unwrap();
            if let Some(slot) = entries.get(&key) {
                self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                slot.clone()
            } else {
                self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                let slot: CacheSlot = std::sync::Arc::new(OnceLock::new());
                entries.insert(key, slot.clone());
                slot
            }
        };

        slot.get_or_init(|| build().map_err(|e| e.to_string()))
            .clone()
            .map_err(LiveCalcError::DataMalformed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
        self.hits.store(0, std::sync::atomic::Ordering::Relaxed);
        self.misses.store(0, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(std::sync::atomic::Ordering::Relaxed);
        let misses = self.misses.load(std::sync::atomic::Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn second_lookup_is_a_hit_and_does_not_rebuild() {
        let cache = VersionCache::new();
        let build_count = Arc::new(AtomicU64::new(0));

        for _ in 0..3 {
            let build_count = build_count.clone();
            let result = cache.get_or_build("mortality", "v1", move || {
                build_count.fetch_add(1, Ordering::SeqCst);
                Ok(ResolvedTable {
                    columns: vec!["qx".to_string()],
                    rows: vec![vec![0.01]],
                })
            });
            assert!(result.is_ok());
        }

        assert_eq!(build_count.load(Ordering::SeqCst), 1);
        assert!(cache.hit_rate() > 0.0);
    }

    #[test]
    fn distinct_versions_are_distinct_keys() {
        let cache = VersionCache::new();
        cache
            .get_or_build("mortality", "v1", || {
                Ok(ResolvedTable {
                    columns: vec![],
                    rows: vec![],
                })
            })
            .unwrap();
        cache
            .get_or_build("mortality", "v2", || {
                Ok(ResolvedTable {
                    columns: vec![],
                    rows: vec![],
                })
            })
            .unwrap();
        assert_eq!(cache.len(), 2);
    }
}
