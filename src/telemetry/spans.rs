// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span utilities for generation requests.

use tracing::{info_span, Span};

/// Extension trait for adding outcomes to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for generation request spans.
pub struct GenerationSpan;

impl GenerationSpan {
    /// Span with `content_id` and `fingerprint` set; `status`, `origin`,
    /// `cache_state`, `error.message` and `latency_ms` are filled in later.
    pub fn new(content_id: &str, fingerprint: &str) -> Span {
        info_span!(
            "generation",
            content_id = %content_id,
            fingerprint = %fingerprint,
            status = tracing::field::Empty,
            origin = tracing::field::Empty,
            cache_state = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }
}
