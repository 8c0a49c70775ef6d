// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Counters and histograms for cache and strategy behaviour.

use std::time::Duration;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    /// Entry present but stale or produced from a different transcript.
    Invalid,
    /// Forced refresh, cache not consulted.
    Bypassed,
}

impl CacheLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Invalid => "invalid",
            Self::Bypassed => "bypassed",
        }
    }
}

pub fn record_cache_lookup(outcome: CacheLookup) {
    metrics::counter!("lectern_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_cache_write_failure() {
    metrics::counter!("lectern_cache_write_failures_total").increment(1);
}

pub fn record_strategy_failure(strategy: &str, kind: &'static str) {
    metrics::counter!(
        "lectern_strategy_failures_total",
        "strategy" => strategy.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_generation(origin: &str, elapsed: Duration) {
    metrics::counter!("lectern_generations_total", "origin" => origin.to_string()).increment(1);
    metrics::histogram!("lectern_generation_seconds").record(elapsed.as_secs_f64());
}
