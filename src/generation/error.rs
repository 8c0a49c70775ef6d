// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use thiserror::Error;

use crate::settings::SettingsError;
use crate::transcript::TranscriptError;

/// Why one strategy did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Failures that cross the orchestrator boundary.
///
/// Strategy, normalization and cache errors are absorbed by fallback; only
/// input problems, contention and total exhaustion are reported.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),

    #[error("A generation is already in progress")]
    Busy,

    #[error("No generation strategy is enabled for these settings")]
    NoStrategy,

    #[error("All strategies failed: {}", join_failures(.failures))]
    Exhausted { failures: Vec<StrategyFailure> },
}

impl GenerationError {
    /// True for problems with the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidSettings(_) | Self::InvalidTranscript(_))
    }

    /// True when the same request may succeed later unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Exhausted { .. })
    }
}

fn join_failures(failures: &[StrategyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_names_every_strategy() {
        let err = GenerationError::Exhausted {
            failures: vec![
                StrategyFailure { strategy: "on-device".into(), reason: "timed out after 10ms".into() },
                StrategyFailure { strategy: "remote".into(), reason: "rejected: HTTP 500".into() },
            ],
        };
        assert_eq!(
            err.to_string(),
            "All strategies failed: on-device: timed out after 10ms | remote: rejected: HTTP 500"
        );
        assert!(!err.is_input_error());
        assert!(err.is_retryable());
        assert!(!GenerationError::NoStrategy.is_retryable());
    }
}
