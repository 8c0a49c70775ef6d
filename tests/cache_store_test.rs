// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cache store: validity window, eviction, failure semantics, file record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use lectern_core::cache::{CacheConfig, CacheStore, FileBackend, ManualClock, MemoryBackend};
use lectern_core::fingerprint::{cache_key, digest, fingerprint_settings, CacheKey};
use lectern_core::settings::GenerationSettings;
use lectern_core::study::{CanonicalResult, QuizItem};

fn payload(notes: &str) -> CanonicalResult {
    CanonicalResult {
        notes_markdown: notes.to_string(),
        study_plan_markdown: None,
        quiz: vec![QuizItem {
            question: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 3,
            explanation: String::new(),
        }],
        source_language: "English".into(),
        source_word_count: 100,
        origin_label: "Remote server".into(),
    }
}

fn key(id: &str) -> CacheKey {
    cache_key(id, &fingerprint_settings(&GenerationSettings::default()))
}

fn clocked(config: CacheConfig) -> (Arc<MemoryBackend>, Arc<ManualClock>, CacheStore) {
    let backend = Arc::new(MemoryBackend::new());
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let store = CacheStore::with_clock(backend.clone(), config, clock.clone());
    (backend, clock, store)
}

#[tokio::test]
async fn test_put_then_get_roundtrip() {
    let (_, _, store) = clocked(CacheConfig::default());
    let d = digest("transcript");
    store.put(&key("vid"), &d, &payload("notes")).await;

    let entry = store.get(&key("vid")).await.unwrap();
    assert_eq!(entry.payload, payload("notes"));
    assert_eq!(entry.key, key("vid"));
    assert!(store.is_valid(&entry, &d));
    assert!(store.get(&key("other")).await.is_none());
}

#[tokio::test]
async fn test_ttl_boundary() {
    let ttl = Duration::from_secs(3600);
    let (_, clock, store) = clocked(CacheConfig { ttl, ..Default::default() });
    let d = digest("t");
    store.put(&key("vid"), &d, &payload("n")).await;
    let entry = store.get(&key("vid")).await.unwrap();

    clock.advance(chrono::Duration::seconds(3600) - chrono::Duration::milliseconds(1));
    assert!(store.is_valid(&entry, &d));

    clock.advance(chrono::Duration::milliseconds(2));
    assert!(!store.is_valid(&entry, &d));
}

#[tokio::test]
async fn test_transcript_mismatch_invalidates() {
    let (_, _, store) = clocked(CacheConfig::default());
    store.put(&key("vid"), &digest("one"), &payload("n")).await;
    let entry = store.get(&key("vid")).await.unwrap();
    assert!(!store.is_valid(&entry, &digest("two")));
}

#[tokio::test]
async fn test_capacity_evicts_oldest() {
    let (backend, clock, store) = clocked(CacheConfig { capacity: 3, ..Default::default() });
    let d = digest("t");
    for id in ["a", "b", "c", "d"] {
        store.put(&key(id), &d, &payload(id)).await;
        clock.advance(chrono::Duration::seconds(1));
    }

    let map = backend.snapshot().unwrap();
    assert_eq!(map.len(), 3);
    assert!(store.get(&key("a")).await.is_none());
    for id in ["b", "c", "d"] {
        assert!(store.get(&key(id)).await.is_some(), "{} should survive", id);
    }

    let listed: Vec<String> = store.entries().await.into_iter().map(|e| e.key.content_id).collect();
    assert_eq!(listed, vec!["d", "c", "b"]);
}

#[tokio::test]
async fn test_rewrite_refreshes_age() {
    let (_, clock, store) = clocked(CacheConfig { capacity: 2, ..Default::default() });
    let d = digest("t");
    store.put(&key("a"), &d, &payload("a")).await;
    clock.advance(chrono::Duration::seconds(1));
    store.put(&key("b"), &d, &payload("b")).await;
    clock.advance(chrono::Duration::seconds(1));
    store.put(&key("a"), &d, &payload("a2")).await;
    clock.advance(chrono::Duration::seconds(1));
    store.put(&key("c"), &d, &payload("c")).await;

    assert!(store.get(&key("b")).await.is_none());
    assert_eq!(store.get(&key("a")).await.unwrap().payload.notes_markdown, "a2");
}

#[tokio::test]
async fn test_failures_never_reach_caller() {
    let (backend, _, store) = clocked(CacheConfig::default());
    let d = digest("t");

    backend.set_fail_writes(true);
    store.put(&key("vid"), &d, &payload("n")).await;
    assert!(store.try_put(&key("vid"), &d, &payload("n")).await.is_err());
    assert!(backend.snapshot().is_none());

    backend.set_fail_writes(false);
    store.put(&key("vid"), &d, &payload("n")).await;
    backend.set_fail_reads(true);
    assert!(store.get(&key("vid")).await.is_none());
    assert!(store.entries().await.is_empty());
}

#[tokio::test]
async fn test_clear_empties_store() {
    let (_, _, store) = clocked(CacheConfig::default());
    store.put(&key("vid"), &digest("t"), &payload("n")).await;
    tokio_test::assert_ok!(store.clear().await);
    assert!(store.entries().await.is_empty());
}

#[tokio::test]
async fn test_file_record_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let d = digest("t");
    {
        let store = CacheStore::new(
            Arc::new(FileBackend::new(dir.path(), "generation-cache")),
            CacheConfig::default(),
        );
        store.put(&key("vid"), &d, &payload("persisted")).await;
    }
    assert!(dir.path().join("generation-cache.json").exists());

    let reopened = CacheStore::new(
        Arc::new(FileBackend::new(dir.path(), "generation-cache")),
        CacheConfig::default(),
    );
    let entry = reopened.get(&key("vid")).await.unwrap();
    assert_eq!(entry.payload.notes_markdown, "persisted");
    assert!(reopened.is_valid(&entry, &d));
}

#[tokio::test]
async fn test_corrupt_file_reads_as_miss() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("generation-cache.json"), "{ not json").unwrap();
    let store = CacheStore::new(
        Arc::new(FileBackend::new(dir.path(), "generation-cache")),
        CacheConfig::default(),
    );
    assert!(store.get(&key("vid")).await.is_none());

    // The next write replaces the corrupt record.
    tokio_test::assert_ok!(store.try_put(&key("vid"), &digest("t"), &payload("n")).await);
    let entry = store.get(&key("vid")).await.unwrap();
    assert!(store.is_valid(&entry, &digest("t")));
    assert_eq!(store.entries().await.len(), 1);
}

#[tokio::test]
async fn test_unreadable_record_is_not_overwritten() {
    let backend = Arc::new(MemoryBackend::new());
    let store = CacheStore::new(backend.clone(), CacheConfig::default());
    store.put(&key("kept"), &digest("t"), &payload("n")).await;

    backend.set_fail_reads(true);
    tokio_test::assert_err!(store.try_put(&key("new"), &digest("t"), &payload("n")).await);
    backend.set_fail_reads(false);

    assert!(store.get(&key("kept")).await.is_some());
    assert!(store.get(&key("new")).await.is_none());
}
