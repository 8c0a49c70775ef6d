// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stable identifiers for transcripts, settings and cache slots.
//!
//! Digests are hex-encoded SHA-256. Collision resistance well beyond what
//! cache deduplication needs, and identical on every platform.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::settings::GenerationSettings;

/// Separator between content id and fingerprint in the flat key form.
const KEY_SEPARATOR: &str = "::";

/// Hex digest of some text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of a canonical `GenerationSettings` serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Digest);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Composite cache identity: which content, generated with which settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub content_id: String,
    pub fingerprint: Fingerprint,
}

impl CacheKey {
    /// Flat string form used as the key of the persisted map.
    pub fn as_record_key(&self) -> String {
        format!("{}{}{}", self.content_id, KEY_SEPARATOR, self.fingerprint)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.content_id, KEY_SEPARATOR, self.fingerprint)
    }
}

/// Deterministic, order-sensitive digest of `text`.
pub fn digest(text: &str) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    Digest(hex::encode(hasher.finalize()))
}

/// Fingerprint settings through their canonical serialization.
///
/// Struct field order is fixed at compile time, so equal settings always
/// serialize to the same bytes.
pub fn fingerprint_settings(settings: &GenerationSettings) -> Fingerprint {
    Fingerprint(digest(&settings.canonical_form()))
}

/// Compose a cache key. An empty content id falls back to `"unknown"`.
pub fn cache_key(content_id: &str, fingerprint: &Fingerprint) -> CacheKey {
    let content_id = content_id.trim();
    let content_id = if content_id.is_empty() { "unknown" } else { content_id };
    CacheKey {
        content_id: content_id.to_string(),
        fingerprint: fingerprint.clone(),
    }
}

/// Derive a content id from a source locator.
///
/// Uses the `v` query parameter when present, then the last path segment of
/// a `/watch/...` or short-link path, and finally a digest of the whole
/// locator when no natural id exists.
pub fn content_id_from_locator(locator: &str) -> String {
    natural_id(locator).unwrap_or_else(|| digest(locator.trim()).as_str()[..16].to_string())
}

fn natural_id(locator: &str) -> Option<String> {
    let without_fragment = locator.split('#').next().unwrap_or_default();
    let (before_query, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some(("v", value)) = pair.split_once('=') {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    let path = match before_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => before_query,
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let short_link = before_query.contains("youtu.be/");
    let watch_path = segments.first().is_some_and(|s| *s == "watch" || *s == "shorts");
    if (short_link || watch_path) && !segments.is_empty() {
        let last = segments[segments.len() - 1];
        if last != "watch" {
            return Some(last.to_string());
        }
    }
    None
}
