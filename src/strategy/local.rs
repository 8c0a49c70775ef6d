// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! On-device model pool.
//!
//! A device may expose several model runtimes. The pool tries them in
//! order (preferred name first) and reports every failure if none answers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use super::{duration_millis, with_timeout, Completion, CompletionClient, CompletionOptions, Readiness, StrategyError};

/// Bound on a single model's readiness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(7);

/// One on-device model runtime.
#[async_trait]
pub trait LocalModel: Send + Sync {
    fn name(&self) -> &str;

    async fn availability(&self) -> Readiness;

    /// Run one prompt and return raw model text.
    async fn prompt(&self, prompt: &str, options: &CompletionOptions) -> Result<String, StrategyError>;
}

/// Ordered set of [`LocalModel`]s behind a single [`CompletionClient`].
pub struct LocalModelPool {
    models: Vec<Arc<dyn LocalModel>>,
    probe_timeout: Duration,
}

impl LocalModelPool {
    pub fn new(models: Vec<Arc<dyn LocalModel>>) -> Self {
        Self {
            models,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name().to_string()).collect()
    }

    /// Models with `preferred` (if registered) moved to the front.
    fn ordered(&self, preferred: Option<&str>) -> Vec<Arc<dyn LocalModel>> {
        let mut ordered = self.models.clone();
        if let Some(name) = preferred {
            // Stable: the remaining models keep their relative order.
            ordered.sort_by_key(|m| m.name() != name);
        }
        ordered
    }

    /// Bounded availability check; a model that does not answer in time is unavailable.
    async fn probe(&self, model: &Arc<dyn LocalModel>) -> Readiness {
        match tokio::time::timeout(self.probe_timeout, model.availability()).await {
            Ok(readiness) => readiness,
            Err(_) => {
                tracing::debug!(model = model.name(), "availability probe timed out");
                Readiness::Unavailable
            }
        }
    }

    async fn run_one(
        &self,
        model: &Arc<dyn LocalModel>,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, StrategyError> {
        let probe = async { Ok(model.availability().await) };
        match with_timeout(self.probe_timeout, probe).await? {
            Readiness::Ready => {}
            Readiness::Downloading => {
                return Err(StrategyError::Unavailable(format!("{} model still downloading", model.name())))
            }
            Readiness::Unavailable => {
                return Err(StrategyError::Unavailable(format!("{} model unavailable", model.name())))
            }
        }
        with_timeout(options.timeout, model.prompt(prompt, options)).await
    }
}

#[async_trait]
impl CompletionClient for LocalModelPool {
    fn name(&self) -> &str {
        "on-device"
    }

    fn backends(&self) -> Vec<String> {
        self.names()
    }

    async fn detect_readiness(&self) -> Readiness {
        let states = join_all(self.models.iter().map(|m| self.probe(m))).await;
        if states.contains(&Readiness::Ready) {
            Readiness::Ready
        } else if states.contains(&Readiness::Downloading) {
            Readiness::Downloading
        } else {
            Readiness::Unavailable
        }
    }

    async fn run_completion(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, StrategyError> {
        if self.models.is_empty() {
            return Err(StrategyError::Unavailable("no on-device models registered".into()));
        }

        let mut failures: Vec<(String, StrategyError)> = Vec::new();
        for model in self.ordered(options.preferred_model.as_deref()) {
            match self.run_one(&model, prompt, options).await {
                Ok(text) => {
                    return Ok(Completion {
                        text: text.trim().to_string(),
                        origin: model.name().to_string(),
                    })
                }
                Err(e) => {
                    tracing::debug!(model = model.name(), error = %e, "on-device model failed");
                    failures.push((model.name().to_string(), e));
                }
            }
        }

        if failures.iter().all(|(_, e)| e.is_timeout()) {
            return Err(StrategyError::Timeout(duration_millis(options.timeout)));
        }
        let joined = failures
            .iter()
            .map(|(name, e)| format!("{}: {}", name, e))
            .collect::<Vec<_>>()
            .join(" | ");
        Err(StrategyError::Unavailable(joined))
    }
}
