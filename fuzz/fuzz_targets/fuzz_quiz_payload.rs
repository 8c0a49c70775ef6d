// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for free-form quiz replies from on-device models.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lectern_core::study::{parse_language_label, parse_raw_quiz_payload};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for item in parse_raw_quiz_payload(&text) {
        assert_eq!(item.options.len(), 4);
        assert!(item.correct_index < 4);
    }
    assert!(!parse_language_label(&text).is_empty());
});
