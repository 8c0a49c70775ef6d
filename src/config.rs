// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `LECTERN_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `LECTERN_SERVER_URL` | http://127.0.0.1:8000 | Remote generation server |
//! | `LECTERN_CACHE_DIR` | .lectern | Directory holding the cache record |
//! | `LECTERN_CACHE_NAMESPACE` | generation-cache | Cache record name |
//! | `LECTERN_CACHE_CAPACITY` | 8 | Max cached generations |
//! | `LECTERN_CACHE_TTL` | 86400 | Cache entry lifetime (secs) |
//! | `LECTERN_CACHE_PURGE_EXPIRED` | false | Drop expired entries on every write |
//! | `LECTERN_MIN_TRANSCRIPT_WORDS` | 25 | Shorter transcripts are rejected |
//! | `LECTERN_MAX_TRANSCRIPT_WORDS` | 3200 | Longer transcripts are clipped |
//! | `LECTERN_REMOTE_TIMEOUT` | 120 | Remote generation timeout (secs) |
//! | `LECTERN_COMPLETION_TIMEOUT` | 45 | On-device notes/quiz prompt timeout (secs) |
//! | `LECTERN_PLAN_TIMEOUT` | 30 | On-device study plan timeout (secs) |
//! | `LECTERN_BRIDGE_READY_TIMEOUT_MS` | 4500 | Wait for the on-device bridge (ms) |
//! | `LECTERN_SETTINGS_FILE` | unset | TOML generation settings |
//! | `LECTERN_LOG_LEVEL` | info | Log filter |
//! | `LECTERN_LOG_FORMAT` | json | `json` or `pretty` |
//! | `LECTERN_LOG_FILE` | unset | Log file instead of stderr |

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::strategy::bridge::BridgeConfig;
use crate::strategy::prompts::PromptTimeouts;
use crate::strategy::remote::{RemoteConfig, DEFAULT_SERVER_URL};
use crate::telemetry::{LogConfig, LogFormat};
use crate::transcript::{TranscriptLimits, DEFAULT_MAX_WORDS, DEFAULT_MIN_WORDS};

pub const DEFAULT_CACHE_DIR: &str = ".lectern";
pub const DEFAULT_CACHE_NAMESPACE: &str = "generation-cache";

/// Effective runtime configuration summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub server_url: String,
    pub cache_dir: String,
    pub cache_namespace: String,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub cache_purge_expired: bool,
    pub min_transcript_words: usize,
    pub max_transcript_words: usize,
    pub remote_timeout_secs: u64,
    pub completion_timeout_secs: u64,
    pub plan_timeout_secs: u64,
    pub bridge_ready_timeout_ms: u64,
    pub settings_file: Option<String>,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<String>,
}

/// Where the cache record lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub dir: PathBuf,
    pub namespace: String,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub remote: RemoteConfig,
    pub cache_location: CacheLocation,
    pub cache: CacheConfig,
    pub transcript: TranscriptLimits,
    pub prompt_timeouts: PromptTimeouts,
    pub bridge: BridgeConfig,
    pub settings_file: Option<PathBuf>,
    pub logging: LogConfig,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a boolean env var (`1/true/yes/on`, `0/false/no/off`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Non-empty string env var.
fn parse_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load remote server configuration from environment.
fn load_remote_config() -> RemoteConfig {
    let base_url = parse_string("LECTERN_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let base_url = base_url.trim_end_matches('/').to_string();
    let timeout_secs = parse_u64("LECTERN_REMOTE_TIMEOUT", 120).max(1);
    RemoteConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        ..Default::default()
    }
}

/// Load cache configuration from environment.
fn load_cache_config() -> (CacheLocation, CacheConfig) {
    let dir = parse_string("LECTERN_CACHE_DIR").unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());
    let namespace =
        parse_string("LECTERN_CACHE_NAMESPACE").unwrap_or_else(|| DEFAULT_CACHE_NAMESPACE.to_string());
    let capacity = parse_usize("LECTERN_CACHE_CAPACITY", 8).max(1);
    let ttl_secs = parse_u64("LECTERN_CACHE_TTL", 24 * 60 * 60).max(1);
    let purge = parse_bool("LECTERN_CACHE_PURGE_EXPIRED", false);
    (
        CacheLocation {
            dir: PathBuf::from(dir),
            namespace,
        },
        CacheConfig {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
            purge_expired_on_write: purge,
        },
    )
}

/// Load transcript limits from environment.
fn load_transcript_limits() -> TranscriptLimits {
    let min_words = parse_usize("LECTERN_MIN_TRANSCRIPT_WORDS", DEFAULT_MIN_WORDS).max(1);
    let max_words = parse_usize("LECTERN_MAX_TRANSCRIPT_WORDS", DEFAULT_MAX_WORDS);
    let max_words = max_words.max(min_words); // max >= min
    TranscriptLimits { min_words, max_words }
}

/// Load on-device timeouts from environment.
fn load_on_device_config() -> (PromptTimeouts, BridgeConfig) {
    let completion = parse_u64("LECTERN_COMPLETION_TIMEOUT", 45).max(1);
    let plan = parse_u64("LECTERN_PLAN_TIMEOUT", 30).max(1);
    let ready_ms = parse_u64("LECTERN_BRIDGE_READY_TIMEOUT_MS", 4500).max(1);
    (
        PromptTimeouts {
            completion: Duration::from_secs(completion),
            study_plan: Duration::from_secs(plan),
        },
        BridgeConfig {
            ready_timeout: Duration::from_millis(ready_ms),
            ..Default::default()
        },
    )
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let level = parse_string("LECTERN_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
    let format = parse_string("LECTERN_LOG_FORMAT")
        .and_then(|f| LogFormat::parse(&f))
        .unwrap_or_default();
    LogConfig {
        format,
        level,
        output_path: parse_string("LECTERN_LOG_FILE").map(PathBuf::from),
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let (cache_location, cache) = load_cache_config();
    let (prompt_timeouts, bridge) = load_on_device_config();
    EnvConfig {
        remote: load_remote_config(),
        cache_location,
        cache,
        transcript: load_transcript_limits(),
        prompt_timeouts,
        bridge,
        settings_file: parse_string("LECTERN_SETTINGS_FILE").map(PathBuf::from),
        logging: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a flat summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            server_url: self.remote.base_url.clone(),
            cache_dir: self.cache_location.dir.display().to_string(),
            cache_namespace: self.cache_location.namespace.clone(),
            cache_capacity: self.cache.capacity,
            cache_ttl_secs: self.cache.ttl.as_secs(),
            cache_purge_expired: self.cache.purge_expired_on_write,
            min_transcript_words: self.transcript.min_words,
            max_transcript_words: self.transcript.max_words,
            remote_timeout_secs: self.remote.timeout.as_secs(),
            completion_timeout_secs: self.prompt_timeouts.completion.as_secs(),
            plan_timeout_secs: self.prompt_timeouts.study_plan.as_secs(),
            bridge_ready_timeout_ms: self.bridge.ready_timeout.as_millis() as u64,
            settings_file: self.settings_file.as_ref().map(|p| p.display().to_string()),
            log_level: self.logging.level.clone(),
            log_format: match self.logging.format {
                LogFormat::Json => "json".to_string(),
                LogFormat::Pretty => "pretty".to_string(),
            },
            log_file: self.logging.output_path.as_ref().map(|p| p.display().to_string()),
        }
    }
}
