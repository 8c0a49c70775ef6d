// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for `lectern-cli` commands.
//!
//! ## Usage
//!
//! ```bash
//! lectern-cli generate talk.txt --url https://youtu.be/abc   # Study material for a transcript
//! lectern-cli cache list                                     # Show cached generations
//! lectern-cli health                                         # Probe the remote server
//! lectern-cli config show                                    # Effective configuration
//! ```
//!
//! Every `run_*` function returns a process exit code.

pub mod cache_cmd;
pub mod config_cmd;
pub mod generate_cmd;
pub mod health_cmd;

use crate::config::EnvConfig;
use crate::settings::{load_settings_file, GenerationSettings, SettingsError};

pub use generate_cmd::{parse_generate_args, read_transcript, GenerateArgs};

/// Exit code: success.
pub const EXIT_OK: i32 = 0;
/// Exit code: operation failed.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code: bad arguments, input or configuration.
pub const EXIT_USAGE: i32 = 2;
/// Exit code: remote server unreachable.
pub const EXIT_CONNECTION: i32 = 3;

/// Generation settings from `LECTERN_SETTINGS_FILE`, or the defaults.
pub fn load_settings(env: &EnvConfig) -> Result<GenerationSettings, SettingsError> {
    match &env.settings_file {
        Some(path) => load_settings_file(path),
        None => Ok(GenerationSettings::default()),
    }
}
