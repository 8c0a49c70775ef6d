// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lectern generation core
//!
//! Turns a lecture transcript into study material (notes, a multiple-choice
//! quiz and a study plan) using whichever generation backend is available,
//! and keeps recent results in a bounded, expiring cache.
//!
//! # Pipeline
//!
//! - **Fingerprinting**: content id + settings digest form the cache key
//! - **Cache**: whole-map record, capacity eviction, lazy TTL expiry
//! - **Strategies**: on-device models (through a request/response bridge)
//!   and a remote HTTP server, tried in preference order
//! - **Normalization**: loosely-shaped backend output becomes a validated
//!   [`study::CanonicalResult`]
//! - **Orchestration**: single-flight state machine tying it together
//!
//! Only input errors and total strategy exhaustion reach the caller; cache
//! and individual strategy failures are absorbed.

pub mod cache;
pub mod cli;
pub mod config;
pub mod fingerprint;
pub mod generation;
pub mod settings;
pub mod strategy;
pub mod study;
pub mod telemetry;
pub mod transcript;

use std::sync::Arc;

use thiserror::Error;

use cache::{CacheConfig, CacheStore, FileBackend};
use config::{CacheLocation, EnvConfig};
use generation::Orchestrator;
use strategy::prompts::PromptTimeouts;
use strategy::{
    spawn_bridge, BridgeClient, BridgeConfig, GenerationStrategy, LocalModel, LocalModelPool,
    OnDeviceConfig, OnDeviceStrategy, RemoteConfig, RemoteStrategy, StrategyError,
};
use transcript::TranscriptLimits;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub remote: RemoteConfig,
    pub cache_location: CacheLocation,
    pub cache: CacheConfig,
    pub transcript: TranscriptLimits,
    pub prompt_timeouts: PromptTimeouts,
    pub bridge: BridgeConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            cache_location: CacheLocation {
                dir: config::DEFAULT_CACHE_DIR.into(),
                namespace: config::DEFAULT_CACHE_NAMESPACE.to_string(),
            },
            cache: CacheConfig::default(),
            transcript: TranscriptLimits::default(),
            prompt_timeouts: PromptTimeouts::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl From<&EnvConfig> for RuntimeConfig {
    fn from(env: &EnvConfig) -> Self {
        Self {
            remote: env.remote.clone(),
            cache_location: env.cache_location.clone(),
            cache: env.cache.clone(),
            transcript: env.transcript,
            prompt_timeouts: env.prompt_timeouts,
            bridge: env.bridge,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Remote strategy setup failed: {0}")]
    Remote(#[from] StrategyError),
}

/// The assembled generation runtime.
pub struct Runtime {
    pub config: RuntimeConfig,
    pub cache: Arc<CacheStore>,
    pub remote: Arc<RemoteStrategy>,
    /// Present when at least one on-device model was registered.
    pub bridge: Option<Arc<BridgeClient>>,
    pub orchestrator: Orchestrator,
}

impl Runtime {
    /// Build the runtime. With local models, an on-device bridge task is
    /// spawned, so this must run inside a tokio runtime.
    pub fn new(config: RuntimeConfig, local_models: Vec<Arc<dyn LocalModel>>) -> Result<Self, RuntimeError> {
        let backend = Arc::new(FileBackend::new(
            &config.cache_location.dir,
            &config.cache_location.namespace,
        ));
        let cache = Arc::new(CacheStore::new(backend, config.cache.clone()));
        let remote = Arc::new(RemoteStrategy::new(config.remote.clone())?);

        let mut strategies: Vec<Arc<dyn GenerationStrategy>> = Vec::new();
        let bridge = if local_models.is_empty() {
            None
        } else {
            let pool = Arc::new(LocalModelPool::new(local_models));
            let client = Arc::new(spawn_bridge(pool, config.bridge));
            strategies.push(Arc::new(OnDeviceStrategy::new(
                client.clone(),
                OnDeviceConfig {
                    timeouts: config.prompt_timeouts,
                },
            )));
            Some(client)
        };
        strategies.push(remote.clone());

        let orchestrator = Orchestrator::new(cache.clone(), strategies, config.transcript);
        Ok(Self {
            config,
            cache,
            remote,
            bridge,
            orchestrator,
        })
    }
}
