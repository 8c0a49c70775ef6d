// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quiz scoring and learner feedback.

use serde::Serialize;

use super::QuizItem;

/// Outcome of grading one quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    /// Rounded percentage of `correct` over `total` (not over `answered`).
    pub percent: u32,
    pub feedback: &'static str,
}

/// Grade `answers` (one optional choice per question) against `quiz`.
///
/// Returns `None` when no question was answered. Answers beyond the quiz
/// length are ignored.
pub fn grade(quiz: &[QuizItem], answers: &[Option<usize>]) -> Option<QuizScore> {
    let mut correct = 0;
    let mut answered = 0;
    for (item, answer) in quiz.iter().zip(answers) {
        if let Some(choice) = answer {
            answered += 1;
            if item.is_correct(*choice) {
                correct += 1;
            }
        }
    }
    if answered == 0 {
        return None;
    }

    let total = quiz.len();
    let percent = ((correct as f64 / total as f64) * 100.0).round() as u32;
    Some(QuizScore {
        correct,
        answered,
        total,
        percent,
        feedback: feedback_for_score(percent),
    })
}

/// Feedback tier for a percentage score.
pub fn feedback_for_score(percent: u32) -> &'static str {
    match percent {
        100.. => "Flawless! Reinforce mastery by teaching the concept to someone else.",
        80..=99 => "Great job. Review the explanations for the few misses to solidify nuance.",
        60..=79 => "Solid progress. Revisit the Priority Topics in the study plan before retesting.",
        _ => "Use the study plan to revisit fundamentals, then attempt the quiz again.",
    }
}
