// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plain-text export of a generation result.

use std::fmt::Write as _;

use super::{option_letter, CanonicalResult};

/// Render notes, quiz and study plan as one plain-text document.
///
/// Markdown emphasis and heading markers are removed.
pub fn export_plain_text(result: &CanonicalResult) -> String {
    let mut out = String::new();

    out.push_str("NOTES\n\n");
    out.push_str(&strip_markdown(&result.notes_markdown));
    out.push_str("\n\nQUIZ\n\n");
    for (i, item) in result.quiz.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.question);
        for (j, option) in item.options.iter().enumerate() {
            let _ = writeln!(out, "{}) {}", option_letter(j), option);
        }
        if item.explanation.is_empty() {
            let _ = writeln!(out, "Answer: {}", item.correct_letter());
        } else {
            let _ = writeln!(out, "Answer: {} - {}", item.correct_letter(), item.explanation);
        }
        out.push('\n');
    }

    if let Some(plan) = result.study_plan_markdown.as_deref().filter(|p| !p.trim().is_empty()) {
        out.push_str("STUDY PLAN\n\n");
        out.push_str(&strip_markdown(plan));
        out.push('\n');
    }
    out
}

fn strip_markdown(md: &str) -> String {
    md.chars().filter(|c| !matches!(c, '#' | '*' | '`')).collect::<String>().trim().to_string()
}
