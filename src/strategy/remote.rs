// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote generation server client.
//!
//! `POST {base}/generate` produces notes and quiz in one call;
//! `GET {base}/health` drives readiness.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{duration_millis, with_timeout, GenerationRequest, GenerationStrategy, Readiness, StrategyError, StrategyKind};
use crate::study::{RawPayload, RawServerPayload};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(120);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Characters of an error body kept in failure messages.
const ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
            health_timeout: HEALTH_TIMEOUT,
        }
    }
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGenerateRequest {
    pub video_url: String,
    pub title: String,
    pub transcript: String,
    pub num_questions: u32,
    pub difficulty: String,
}

impl From<&GenerationRequest> for RemoteGenerateRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            video_url: request.source_url.clone(),
            title: request.title.clone(),
            transcript: request.transcript.text().to_string(),
            num_questions: request.settings.num_questions,
            difficulty: request.settings.difficulty.as_str().to_string(),
        }
    }
}

/// Body of `GET /health`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealth {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

pub struct RemoteStrategy {
    http_client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteStrategy {
    pub fn new(config: RemoteConfig) -> Result<Self, StrategyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| StrategyError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            http_client,
            config: RemoteConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// Query `/health`.
    pub async fn health(&self) -> Result<ServerHealth, StrategyError> {
        let limit = self.config.health_timeout;
        with_timeout(limit, async {
            let response = self
                .http_client
                .get(self.endpoint("health"))
                .timeout(limit)
                .send()
                .await
                .map_err(|e| map_transport_error(e, limit))?;
            let status = response.status();
            if !status.is_success() {
                return Err(StrategyError::Rejected(format!("health returned HTTP {}", status.as_u16())));
            }
            let body = response.text().await.map_err(|e| map_transport_error(e, limit))?;
            serde_json::from_str(&body).map_err(|e| StrategyError::Rejected(format!("malformed health body: {}", e)))
        })
        .await
    }

    async fn post_generate(&self, request: &GenerationRequest) -> Result<RawServerPayload, StrategyError> {
        let limit = self.config.timeout;
        let body = RemoteGenerateRequest::from(request);
        tracing::debug!(
            url = %self.config.base_url,
            words = request.transcript.word_count(),
            num_questions = body.num_questions,
            "requesting remote generation"
        );

        let response = self
            .http_client
            .post(self.endpoint("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, limit))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| map_transport_error(e, limit))?;
        if !status.is_success() {
            return Err(StrategyError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(text.trim(), ERROR_BODY_CHARS)
            )));
        }

        serde_json::from_str(&text).map_err(|e| StrategyError::Rejected(format!("malformed response body: {}", e)))
    }
}

fn map_transport_error(e: reqwest::Error, limit: Duration) -> StrategyError {
    if e.is_timeout() {
        StrategyError::Timeout(duration_millis(limit))
    } else {
        StrategyError::Unavailable(e.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl GenerationStrategy for RemoteStrategy {
    fn name(&self) -> &str {
        "remote"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Remote
    }

    async fn detect_readiness(&self) -> Readiness {
        match self.health().await {
            Ok(_) => Readiness::Ready,
            Err(e) => {
                tracing::debug!(error = %e, "remote server not ready");
                Readiness::Unavailable
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawPayload, StrategyError> {
        let payload = with_timeout(self.config.timeout, self.post_generate(request)).await?;
        Ok(RawPayload::Server(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let strategy = RemoteStrategy::new(RemoteConfig {
            base_url: "http://localhost:9000//".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(strategy.base_url(), "http://localhost:9000");
        assert_eq!(strategy.endpoint("generate"), "http://localhost:9000/generate");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[test]
    fn test_health_body_tolerates_extra_fields() {
        let health: ServerHealth =
            serde_json::from_str(r#"{"ok":true,"api_version":"7.2","model":"m","extra":1}"#).unwrap();
        assert!(health.ok);
        assert_eq!(health.model.as_deref(), Some("m"));
    }
}
