// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Study material produced by a generation: notes, quiz and study plan.
//!
//! `CanonicalResult` is the unit that is cached and returned. Raw backend
//! output enters through [`RawPayload`] and only becomes a `CanonicalResult`
//! via [`normalize::normalize_payload`].

pub mod export;
pub mod grading;
pub mod normalize;

use serde::{Deserialize, Serialize};

pub use export::export_plain_text;
pub use grading::{feedback_for_score, grade, QuizScore};
pub use normalize::{
    normalize_payload, normalize_quiz, parse_language_label, parse_raw_quiz_payload,
    NormalizationError,
};

/// Number of options every quiz item carries.
pub const OPTION_COUNT: usize = 4;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizItem {
    /// Letter (A-D) of the correct option.
    pub fn correct_letter(&self) -> char {
        option_letter(self.correct_index)
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }
}

pub(crate) fn option_letter(index: usize) -> char {
    (b'A' + (index.min(25) as u8)) as char
}

/// Reconciled generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub notes_markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_plan_markdown: Option<String>,
    pub quiz: Vec<QuizItem>,
    pub source_language: String,
    pub source_word_count: usize,
    pub origin_label: String,
}

impl CanonicalResult {
    pub fn has_study_plan(&self) -> bool {
        self.study_plan_markdown
            .as_deref()
            .is_some_and(|plan| !plan.trim().is_empty())
    }
}

/// Body returned by the remote generation server.
///
/// Quiz items stay loosely typed until normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawServerPayload {
    #[serde(alias = "notesMarkdown")]
    pub notes_markdown: String,
    #[serde(default)]
    pub quiz: Vec<serde_json::Value>,
    #[serde(default, alias = "studyPlanMarkdown", alias = "study_plan_md")]
    pub study_plan_markdown: Option<String>,
    #[serde(default, alias = "sourceLanguage")]
    pub source_language: Option<String>,
    #[serde(default, alias = "source_words", alias = "sourceWordCount")]
    pub source_word_count: Option<usize>,
}

/// Text replies collected from an on-device model, one per prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOnDeviceText {
    pub language_reply: Option<String>,
    pub notes_reply: String,
    pub quiz_reply: String,
    /// Absent when the optional plan prompt failed.
    pub plan_reply: Option<String>,
    pub origin: String,
}

/// Raw output of whichever strategy answered.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Server(RawServerPayload),
    OnDevice(RawOnDeviceText),
}
