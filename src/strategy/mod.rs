// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generation strategies.
//!
//! Two layers:
//! - [`CompletionClient`]: prompt text in, text out (on-device models, the bridge).
//! - [`GenerationStrategy`]: a whole generation request in, a [`RawPayload`] out
//!   (the on-device prompt set, the remote server).
//!
//! Readiness is advisory. Every call is fallible regardless of what
//! `detect_readiness` said a moment ago.

pub mod bridge;
mod error;
pub mod local;
pub mod on_device;
pub mod prompts;
pub mod remote;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::settings::GenerationSettings;
use crate::study::RawPayload;
use crate::transcript::PreparedTranscript;

pub use bridge::{spawn_bridge, BridgeAnnouncement, BridgeClient, BridgeConfig};
pub use error::StrategyError;
pub use local::{LocalModel, LocalModelPool};
pub use on_device::{on_device_origin, OnDeviceConfig, OnDeviceStrategy};
pub use remote::{RemoteConfig, RemoteStrategy, ServerHealth};

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(45);

/// Availability of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    /// Model is still being fetched to the device.
    Downloading,
    Unavailable,
}

/// Options for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
    pub stop_sequences: Vec<String>,
    pub timeout: Duration,
    /// Local model to try first.
    pub preferred_model: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: 0.6,
            top_k: None,
            top_p: Some(0.9),
            max_output_tokens: 2048,
            stop_sequences: Vec::new(),
            timeout: DEFAULT_COMPLETION_TIMEOUT,
            preferred_model: None,
        }
    }
}

/// Text produced by a completion, with the concrete backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub origin: String,
}

/// Prompt-level client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn name(&self) -> &str;

    /// Concrete backends this client can route to.
    fn backends(&self) -> Vec<String> {
        vec![self.name().to_string()]
    }

    async fn detect_readiness(&self) -> Readiness;

    /// Run one prompt. Must fail with `Timeout` once `options.timeout` elapses.
    async fn run_completion(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, StrategyError>;
}

/// Where a strategy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    OnDevice,
    Remote,
}

/// Everything a strategy needs to generate study material.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub transcript: PreparedTranscript,
    pub title: String,
    pub source_url: String,
    pub settings: GenerationSettings,
}

impl GenerationRequest {
    /// Header shared by every prompt of the request.
    pub fn header(&self) -> String {
        prompts::request_header(self)
    }
}

/// Request-level strategy.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> StrategyKind;

    async fn detect_readiness(&self) -> Readiness;

    /// Produce the raw notes + quiz payload.
    async fn generate(&self, request: &GenerationRequest) -> Result<RawPayload, StrategyError>;

    /// Produce only the study plan. Strategies without a plan prompt refuse.
    async fn study_plan(&self, request: &GenerationRequest) -> Result<Completion, StrategyError> {
        let _ = request;
        Err(StrategyError::Unavailable(format!(
            "{} does not produce study plans",
            self.name()
        )))
    }
}

/// Await `fut`, failing with [`StrategyError::Timeout`] after `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StrategyError>
where
    F: Future<Output = Result<T, StrategyError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StrategyError::Timeout(duration_millis(limit))),
    }
}

pub(crate) fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
