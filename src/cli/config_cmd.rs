// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables
//! and never contact a backend.

use super::{load_settings, EXIT_FAILURE, EXIT_OK};
use crate::config::{self, EffectiveConfig};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("LECTERN_SERVER_URL=http://127.0.0.1:8000");
    println!("LECTERN_CACHE_DIR=.lectern");
    println!("LECTERN_CACHE_NAMESPACE=generation-cache");
    println!("LECTERN_CACHE_CAPACITY=8");
    println!("LECTERN_CACHE_TTL=86400");
    println!("LECTERN_CACHE_PURGE_EXPIRED=false");
    println!("LECTERN_MIN_TRANSCRIPT_WORDS=25");
    println!("LECTERN_MAX_TRANSCRIPT_WORDS=3200");
    println!("LECTERN_REMOTE_TIMEOUT=120");
    println!("LECTERN_COMPLETION_TIMEOUT=45");
    println!("LECTERN_PLAN_TIMEOUT=30");
    println!("LECTERN_BRIDGE_READY_TIMEOUT_MS=4500");
    println!("LECTERN_SETTINGS_FILE=");
    println!("LECTERN_LOG_LEVEL=info");
    println!("LECTERN_LOG_FORMAT=json");
    println!("LECTERN_LOG_FILE=");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let env = config::load();
    let warnings = collect_warnings(&env);
    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

fn collect_warnings(env: &config::EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let url = &env.remote.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        warnings.push(format!("LECTERN_SERVER_URL ({}) is not an http(s) URL", url));
    }
    if env.cache.ttl.as_secs() < 60 {
        warnings.push(format!(
            "LECTERN_CACHE_TTL ({}s) expires entries almost immediately",
            env.cache.ttl.as_secs()
        ));
    }
    if env.prompt_timeouts.study_plan > env.prompt_timeouts.completion {
        warnings.push("LECTERN_PLAN_TIMEOUT exceeds LECTERN_COMPLETION_TIMEOUT".to_string());
    }
    if let Err(e) = load_settings(env) {
        warnings.push(format!("LECTERN_SETTINGS_FILE: {}", e));
    }
    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    println!("LECTERN_SERVER_URL={}", cfg.server_url);
    println!("LECTERN_CACHE_DIR={}", cfg.cache_dir);
    println!("LECTERN_CACHE_NAMESPACE={}", cfg.cache_namespace);
    println!("LECTERN_CACHE_CAPACITY={}", cfg.cache_capacity);
    println!("LECTERN_CACHE_TTL={}", cfg.cache_ttl_secs);
    println!("LECTERN_CACHE_PURGE_EXPIRED={}", cfg.cache_purge_expired);
    println!("LECTERN_MIN_TRANSCRIPT_WORDS={}", cfg.min_transcript_words);
    println!("LECTERN_MAX_TRANSCRIPT_WORDS={}", cfg.max_transcript_words);
    println!("LECTERN_REMOTE_TIMEOUT={}", cfg.remote_timeout_secs);
    println!("LECTERN_COMPLETION_TIMEOUT={}", cfg.completion_timeout_secs);
    println!("LECTERN_PLAN_TIMEOUT={}", cfg.plan_timeout_secs);
    println!("LECTERN_BRIDGE_READY_TIMEOUT_MS={}", cfg.bridge_ready_timeout_ms);
    println!("LECTERN_SETTINGS_FILE={}", cfg.settings_file.as_deref().unwrap_or(""));
    println!("LECTERN_LOG_LEVEL={}", cfg.log_level);
    println!("LECTERN_LOG_FORMAT={}", cfg.log_format);
    println!("LECTERN_LOG_FILE={}", cfg.log_file.as_deref().unwrap_or(""));
}
