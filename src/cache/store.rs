// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cache store: lookup, validity and capacity eviction over a backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{CacheBackend, CacheEntry, CacheError, CacheMap, Clock, SystemClock};
use crate::fingerprint::{CacheKey, Digest};
use crate::study::CanonicalResult;
use crate::telemetry;

pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
    /// Drop expired entries on every write instead of waiting for eviction.
    pub purge_expired_on_write: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
            purge_expired_on_write: false,
        }
    }
}

/// Bounded, TTL'd store of generation results.
///
/// Read failures behave as misses and write failures are logged; neither
/// reaches the caller of [`CacheStore::get`] or [`CacheStore::put`].
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    /// Serializes read-evict-write sequences.
    write_lock: Mutex<()>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn CacheBackend>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            config: CacheConfig {
                capacity: config.capacity.max(1),
                ..config
            },
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Entry stored under `key`, valid or not.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.backend.read().await {
            Ok(mut map) => map.remove(&key.as_record_key()),
            Err(e) => {
                tracing::warn!(error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Insert or overwrite `key`, evict down to capacity, persist the map.
    ///
    /// Failures are logged and swallowed.
    pub async fn put(&self, key: &CacheKey, transcript_digest: &Digest, payload: &CanonicalResult) {
        if let Err(e) = self.try_put(key, transcript_digest, payload).await {
            telemetry::record_cache_write_failure();
            tracing::warn!(error = %e, key = %key, "cache write skipped");
        }
    }

    /// [`CacheStore::put`] with the failure reported.
    pub async fn try_put(
        &self,
        key: &CacheKey,
        transcript_digest: &Digest,
        payload: &CanonicalResult,
    ) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut map = match self.backend.read().await {
            Ok(map) => map,
            Err(CacheError::Corrupt(reason)) => {
                tracing::warn!(%reason, "cache record corrupt, replacing it");
                CacheMap::new()
            }
            Err(e) => return Err(e),
        };
        let now = self.clock.now();
        let record_key = key.as_record_key();
        map.insert(
            record_key.clone(),
            CacheEntry {
                key: key.clone(),
                transcript_digest: transcript_digest.clone(),
                payload: payload.clone(),
                saved_at: now,
            },
        );
        if self.config.purge_expired_on_write {
            map.retain(|_, entry| !self.is_expired_at(entry, now));
        }
        let evicted = evict_to_capacity(&mut map, self.config.capacity, &record_key);
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.config.capacity, "cache eviction");
        }
        self.backend.write(&map).await
    }

    /// True iff the entry was produced from this transcript and is younger than the TTL.
    pub fn is_valid(&self, entry: &CacheEntry, transcript_digest: &Digest) -> bool {
        self.is_valid_at(entry, transcript_digest, self.clock.now())
    }

    pub fn is_valid_at(&self, entry: &CacheEntry, transcript_digest: &Digest, now: DateTime<Utc>) -> bool {
        entry.transcript_digest == *transcript_digest && !self.is_expired_at(entry, now)
    }

    fn is_expired_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(entry.saved_at);
        match chrono::Duration::from_std(self.config.ttl) {
            Ok(ttl) => age >= ttl,
            Err(_) => false,
        }
    }

    /// All entries, newest first. Read failures yield an empty list.
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let map = match self.backend.read().await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "cache read failed");
                return Vec::new();
            }
        };
        let mut entries: Vec<CacheEntry> = map.into_values().collect();
        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        entries
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        self.backend.write(&CacheMap::new()).await
    }
}

/// Drop oldest-`saved_at` entries until `map.len() <= capacity`.
///
/// `written` sorts newest among equal timestamps, so the entry just stored
/// is never the one evicted.
fn evict_to_capacity(map: &mut CacheMap, capacity: usize, written: &str) -> usize {
    if map.len() <= capacity {
        return 0;
    }
    let mut by_age: Vec<(DateTime<Utc>, bool, String)> = map
        .iter()
        .map(|(k, e)| (e.saved_at, k == written, k.clone()))
        .collect();
    by_age.sort();
    let excess = map.len() - capacity;
    for (_, _, key) in by_age.into_iter().take(excess) {
        map.remove(&key);
    }
    excess
}
