// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cache CLI subcommands: list, clear.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{EXIT_FAILURE, EXIT_OK};
use crate::cache::{CacheEntry, CacheStore, FileBackend};
use crate::config::EnvConfig;
use crate::generation::format_relative_age;

fn open_store(env: &EnvConfig) -> CacheStore {
    let backend = FileBackend::new(&env.cache_location.dir, &env.cache_location.namespace);
    CacheStore::new(Arc::new(backend), env.cache.clone())
}

/// Run `cache list`. Returns 0.
pub async fn run_list(env: &EnvConfig) -> i32 {
    let store = open_store(env);
    let entries = store.entries().await;
    print_entries(&store, &entries, store.now());
    EXIT_OK
}

/// Run `cache clear`. Returns 0 on success, 1 if the record could not be written.
pub async fn run_clear(env: &EnvConfig) -> i32 {
    let store = open_store(env);
    match store.clear().await {
        Ok(()) => {
            println!("Cache cleared.");
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error clearing cache: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Format and print cache entries to stdout.
pub fn print_entries(store: &CacheStore, entries: &[CacheEntry], now: DateTime<Utc>) {
    if entries.is_empty() {
        println!("Cache is empty.");
        return;
    }

    println!(
        "{:<24} {:<14} {:>9} {:>6} {:<8} {:<16}",
        "CONTENT", "FINGERPRINT", "QUESTIONS", "PLAN", "STATE", "SAVED"
    );
    println!("{}", "-".repeat(82));

    let mut expired = 0;
    for entry in entries {
        let live = store.is_valid_at(entry, &entry.transcript_digest, now);
        if !live {
            expired += 1;
        }
        println!(
            "{:<24} {:<14} {:>9} {:>6} {:<8} {:<16}",
            truncate(&entry.key.content_id, 23),
            truncate(entry.key.fingerprint.as_str(), 12),
            entry.payload.quiz.len(),
            if entry.payload.has_study_plan() { "yes" } else { "no" },
            if live { "live" } else { "expired" },
            format_relative_age(entry.saved_at, now),
        );
    }

    println!("{}", "-".repeat(82));
    println!(
        "{} entr{} ({} expired)  |  capacity {}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        expired,
        store.config().capacity
    );
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
