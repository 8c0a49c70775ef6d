// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Transcript input and preparation.
//!
//! The core never looks at segment timing: segments are concatenated into
//! one text, checked against word limits, clipped and digested once so every
//! strategy and the cache see the same bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::{digest, Digest};

pub const DEFAULT_MIN_WORDS: usize = 25;
pub const DEFAULT_MAX_WORDS: usize = 3200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcript too short: {words} words, minimum {min}")]
    TooShort { words: usize, min: usize },
}

/// One timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_offset_secs: f64,
    pub text: String,
}

/// Transcript as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transcript {
    Segments(Vec<TranscriptSegment>),
    Text(String),
}

impl Transcript {
    /// Whitespace-collapsed transcript text.
    pub fn text(&self) -> String {
        match self {
            Self::Segments(segments) => collapse_whitespace(
                segments.iter().map(|s| s.text.as_str()).filter(|t| !t.trim().is_empty()),
            ),
            Self::Text(text) => collapse_whitespace(std::iter::once(text.as_str())),
        }
    }
}

impl From<String> for Transcript {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Transcript {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Word-count bounds applied before any strategy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptLimits {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for TranscriptLimits {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Transcript text after clipping, plus its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTranscript {
    text: String,
    word_count: usize,
    digest: Digest,
    clipped: bool,
}

impl PreparedTranscript {
    pub fn prepare(transcript: &Transcript, limits: TranscriptLimits) -> Result<Self, TranscriptError> {
        let full = transcript.text();
        let words: Vec<&str> = full.split(' ').filter(|w| !w.is_empty()).collect();
        if words.len() < limits.min_words {
            return Err(TranscriptError::TooShort {
                words: words.len(),
                min: limits.min_words,
            });
        }

        let clipped = words.len() > limits.max_words;
        let (text, word_count) = if clipped {
            (words[..limits.max_words].join(" "), limits.max_words)
        } else {
            let count = words.len();
            (full, count)
        };
        let digest = digest(&text);
        Ok(Self { text, word_count, digest, clipped })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn was_clipped(&self) -> bool {
        self.clipped
    }

    /// Leading slice of at most `max_chars` characters.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}
