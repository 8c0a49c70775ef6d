// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded, TTL'd store of previous generation results.
//!
//! The whole key -> entry map is loaded, mutated and persisted as one
//! record. Expired entries read as absent but keep their slot until the
//! capacity bound pushes them out.

mod backend;
mod clock;
mod store;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::{CacheKey, Digest};
use crate::study::CanonicalResult;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CacheConfig, CacheStore, DEFAULT_CAPACITY, DEFAULT_TTL};

/// Persisted map, keyed by [`CacheKey::as_record_key`].
pub type CacheMap = BTreeMap<String, CacheEntry>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache record unreadable: {0}")]
    Read(String),

    #[error("Cache record unwritable: {0}")]
    Write(String),

    #[error("Cache record corrupt: {0}")]
    Corrupt(String),
}

/// One cached generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub transcript_digest: Digest,
    pub payload: CanonicalResult,
    pub saved_at: DateTime<Utc>,
}
