// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generation settings: one value object per request, with documented defaults.
//!
//! | Field | Default | Range |
//! |---|---|---|
//! | `num_questions` | 5 | 1..=12 |
//! | `difficulty` | `mixed` | `easy`, `mixed`, `hard`, `exam` |
//! | `prefer_local` | true | |
//! | `strategy_preference` | `auto` | `auto` or a local model name |
//! | `temperature` | 0.6 | 0.0..=1.0 |

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 12;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read settings file: {0}")]
    Io(String),

    #[error("Failed to parse settings file: {0}")]
    Parse(String),
}

/// Target difficulty of generated questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Mixed,
    Hard,
    Exam,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Mixed => "mixed",
            Self::Hard => "hard",
            Self::Exam => "exam",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which on-device model to try first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyPreference {
    #[default]
    Auto,
    Named(String),
}

impl StrategyPreference {
    /// Model name to try first, if any.
    pub fn preferred_name(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Named(name) => Some(name.as_str()),
        }
    }
}

impl From<String> for StrategyPreference {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else {
            Self::Named(trimmed.to_string())
        }
    }
}

impl From<StrategyPreference> for String {
    fn from(value: StrategyPreference) -> Self {
        match value {
            StrategyPreference::Auto => "auto".to_string(),
            StrategyPreference::Named(name) => name,
        }
    }
}

/// Settings for one generation request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub num_questions: u32,
    pub difficulty: Difficulty,
    pub prefer_local: bool,
    pub strategy_preference: StrategyPreference,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            num_questions: 5,
            difficulty: Difficulty::Mixed,
            prefer_local: true,
            strategy_preference: StrategyPreference::Auto,
            temperature: 0.6,
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(SettingsError::Invalid {
                field: "num_questions",
                reason: format!(
                    "must be in {}..={}, got {}",
                    MIN_QUESTIONS, MAX_QUESTIONS, self.num_questions
                ),
            });
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(SettingsError::Invalid {
                field: "temperature",
                reason: format!("must be in [0, 1], got {}", self.temperature),
            });
        }
        Ok(())
    }

    /// Canonical serialization used for fingerprinting.
    pub fn canonical_form(&self) -> String {
        // Field order follows the struct declaration; temperature is printed
        // from its bit-exact f32 value.
        format!(
            "num_questions={};difficulty={};prefer_local={};strategy={};temperature={:?}",
            self.num_questions,
            self.difficulty,
            self.prefer_local,
            String::from(self.strategy_preference.clone()),
            self.temperature,
        )
    }
}

/// Load settings from a TOML file. Missing fields take their defaults.
pub fn load_settings_file(path: &Path) -> Result<GenerationSettings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
    parse_settings(&raw)
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(raw: &str) -> Result<GenerationSettings, SettingsError> {
    let settings: GenerationSettings =
        toml::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = GenerationSettings::default();
        assert_eq!(s.num_questions, 5);
        assert_eq!(s.difficulty, Difficulty::Mixed);
        assert!(s.prefer_local);
        assert_eq!(s.strategy_preference, StrategyPreference::Auto);
        assert!((s.temperature - 0.6).abs() < f32::EPSILON);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_questions() {
        let s = GenerationSettings { num_questions: 0, ..Default::default() };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::Invalid { field: "num_questions", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_temperature_out_of_range() {
        let s = GenerationSettings { temperature: 1.5, ..Default::default() };
        assert!(s.validate().is_err());
        let s = GenerationSettings { temperature: f32::NAN, ..Default::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let s = parse_settings("num_questions = 3\ndifficulty = \"hard\"\n").unwrap();
        assert_eq!(s.num_questions, 3);
        assert_eq!(s.difficulty, Difficulty::Hard);
        assert!(s.prefer_local);
    }

    #[test]
    fn test_parse_strategy_preference() {
        let s = parse_settings("strategy_preference = \"nano-v2\"").unwrap();
        assert_eq!(s.strategy_preference.preferred_name(), Some("nano-v2"));
        let s = parse_settings("strategy_preference = \"AUTO\"").unwrap();
        assert_eq!(s.strategy_preference, StrategyPreference::Auto);
    }

    #[test]
    fn test_parse_invalid_value_rejected() {
        assert!(matches!(
            parse_settings("num_questions = 40"),
            Err(SettingsError::Invalid { .. })
        ));
        assert!(matches!(
            parse_settings("difficulty = \"impossible\""),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_canonical_form_distinguishes_fields() {
        let base = GenerationSettings::default();
        let other = GenerationSettings { prefer_local: false, ..Default::default() };
        assert_ne!(base.canonical_form(), other.canonical_form());
        assert_eq!(base.canonical_form(), GenerationSettings::default().canonical_form());
    }
}
