// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for remote server response bodies.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lectern_core::study::{normalize_payload, RawPayload, RawServerPayload};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<RawServerPayload>(data) else {
        return;
    };
    if let Ok(result) = normalize_payload(RawPayload::Server(payload), 0) {
        assert!(!result.quiz.is_empty());
        assert!(!result.notes_markdown.is_empty());
    }
});
