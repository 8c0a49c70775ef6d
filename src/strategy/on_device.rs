// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! On-device generation: four prompts over one [`CompletionClient`].
//!
//! Notes and quiz are required. Language detection and the study plan
//! are best-effort; their failures are logged and leave the field empty.

use std::sync::Arc;

use async_trait::async_trait;

use super::prompts::{self, Prompt, PromptTimeouts};
use super::{
    Completion, CompletionClient, GenerationRequest, GenerationStrategy, Readiness, StrategyError,
    StrategyKind,
};
use crate::study::{RawOnDeviceText, RawPayload};

#[derive(Debug, Clone, Copy, Default)]
pub struct OnDeviceConfig {
    pub timeouts: PromptTimeouts,
}

pub struct OnDeviceStrategy {
    client: Arc<dyn CompletionClient>,
    config: OnDeviceConfig,
}

impl OnDeviceStrategy {
    pub fn new(client: Arc<dyn CompletionClient>, config: OnDeviceConfig) -> Self {
        Self { client, config }
    }

    async fn run(&self, prompt: Prompt) -> Result<Completion, StrategyError> {
        self.client.run_completion(&prompt.text, &prompt.options).await
    }

    async fn run_optional(&self, what: &'static str, prompt: Prompt) -> Option<String> {
        match self.run(prompt).await {
            Ok(completion) => Some(completion.text),
            Err(e) => {
                tracing::warn!(prompt = what, error = %e, "optional on-device prompt failed");
                None
            }
        }
    }
}

/// Provenance label for an on-device backend name.
pub fn on_device_origin(backend: &str) -> String {
    if backend.trim().is_empty() {
        "On-device".to_string()
    } else {
        format!("On-device ({})", backend.trim())
    }
}

#[async_trait]
impl GenerationStrategy for OnDeviceStrategy {
    fn name(&self) -> &str {
        "on-device"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::OnDevice
    }

    async fn detect_readiness(&self) -> Readiness {
        self.client.detect_readiness().await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawPayload, StrategyError> {
        match self.client.detect_readiness().await {
            Readiness::Ready => {}
            Readiness::Downloading => {
                return Err(StrategyError::Unavailable("on-device model still downloading".into()))
            }
            Readiness::Unavailable => {
                return Err(StrategyError::Unavailable("on-device AI not available".into()))
            }
        }

        let timeouts = self.config.timeouts;
        let language_reply = self.run_optional("language", prompts::language_prompt(request)).await;
        let notes = self.run(prompts::notes_prompt(request, timeouts)).await?;
        let quiz = self.run(prompts::quiz_prompt(request, timeouts)).await?;
        let plan_reply = self
            .run_optional("study_plan", prompts::study_plan_prompt(request, timeouts))
            .await;

        Ok(RawPayload::OnDevice(RawOnDeviceText {
            language_reply,
            notes_reply: notes.text,
            quiz_reply: quiz.text,
            plan_reply,
            origin: on_device_origin(&quiz.origin),
        }))
    }

    async fn study_plan(&self, request: &GenerationRequest) -> Result<Completion, StrategyError> {
        let prompt = prompts::study_plan_prompt(request, self.config.timeouts);
        let completion = self.run(prompt).await?;
        if completion.text.trim().is_empty() {
            return Err(StrategyError::Rejected("empty study plan".into()));
        }
        Ok(Completion {
            text: completion.text.trim().to_string(),
            origin: on_device_origin(&completion.origin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_label() {
        assert_eq!(on_device_origin("window.ai"), "On-device (window.ai)");
        assert_eq!(on_device_origin(" "), "On-device");
    }
}
