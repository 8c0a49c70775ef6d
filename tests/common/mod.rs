// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

use lectern_core::cache::{CacheConfig, CacheStore, MemoryBackend};
use lectern_core::settings::GenerationSettings;
use lectern_core::strategy::{
    Completion, CompletionOptions, GenerationRequest, GenerationStrategy, LocalModel, Readiness,
    StrategyError, StrategyKind,
};
use lectern_core::study::{RawOnDeviceText, RawPayload, RawServerPayload};
use lectern_core::transcript::{PreparedTranscript, Transcript, TranscriptLimits};

/// `n` space-separated words.
pub fn words(n: usize, word: &str) -> String {
    vec![word; n].join(" ")
}

pub fn quiz_item(question: &str, answer: serde_json::Value) -> serde_json::Value {
    json!({
        "question": question,
        "options": ["alpha", "beta", "gamma", "delta"],
        "correct_index": answer,
        "explanation": "because",
    })
}

pub fn server_payload(questions: usize) -> RawServerPayload {
    RawServerPayload {
        notes_markdown: "# Notes\n- point".to_string(),
        quiz: (0..questions).map(|i| quiz_item(&format!("Q{}?", i + 1), json!(i % 4))).collect(),
        study_plan_markdown: None,
        source_language: Some("English".to_string()),
        source_word_count: None,
    }
}

pub fn on_device_payload(questions: usize, origin: &str) -> RawOnDeviceText {
    let items: Vec<_> = (0..questions).map(|i| quiz_item(&format!("Q{}?", i + 1), json!("B"))).collect();
    RawOnDeviceText {
        language_reply: Some("English".to_string()),
        notes_reply: "## Local notes".to_string(),
        quiz_reply: serde_json::to_string(&items).unwrap_or_default(),
        plan_reply: None,
        origin: origin.to_string(),
    }
}

pub fn memory_store() -> (Arc<MemoryBackend>, Arc<CacheStore>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(CacheStore::new(backend.clone(), CacheConfig::default()));
    (backend, store)
}

pub fn request(word_count: usize, settings: GenerationSettings) -> GenerationRequest {
    let transcript = Transcript::Text(words(word_count, "lecture"));
    GenerationRequest {
        transcript: PreparedTranscript::prepare(&transcript, TranscriptLimits::default())
            .expect("transcript long enough"),
        title: "Test talk".to_string(),
        source_url: "https://www.youtube.com/watch?v=abc123".to_string(),
        settings,
    }
}

/// What a [`ScriptedStrategy`] does on each call.
#[derive(Clone)]
pub enum Script {
    Payload(RawPayload),
    Fail(StrategyError),
    /// Wait for the gate, then return the payload.
    Gated(Arc<Notify>, RawPayload),
}

/// Strategy returning a fixed outcome and counting calls.
pub struct ScriptedStrategy {
    name: String,
    kind: StrategyKind,
    script: Script,
    plan: Mutex<Option<Result<String, StrategyError>>>,
    calls: AtomicUsize,
    plan_calls: AtomicUsize,
}

impl ScriptedStrategy {
    pub fn new(name: &str, kind: StrategyKind, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            script,
            plan: Mutex::new(None),
            calls: AtomicUsize::new(0),
            plan_calls: AtomicUsize::new(0),
        })
    }

    pub fn remote_ok(questions: usize) -> Arc<Self> {
        Self::new("remote", StrategyKind::Remote, Script::Payload(RawPayload::Server(server_payload(questions))))
    }

    pub fn remote_failing(error: StrategyError) -> Arc<Self> {
        Self::new("remote", StrategyKind::Remote, Script::Fail(error))
    }

    pub fn on_device_failing(error: StrategyError) -> Arc<Self> {
        Self::new("on-device", StrategyKind::OnDevice, Script::Fail(error))
    }

    pub fn with_plan(self: Arc<Self>, plan: Result<String, StrategyError>) -> Arc<Self> {
        *self.plan.lock() = Some(plan);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn detect_readiness(&self) -> Readiness {
        Readiness::Ready
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<RawPayload, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Payload(payload) => Ok(payload.clone()),
            Script::Fail(error) => Err(error.clone()),
            Script::Gated(gate, payload) => {
                gate.notified().await;
                Ok(payload.clone())
            }
        }
    }

    async fn study_plan(&self, _request: &GenerationRequest) -> Result<Completion, StrategyError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        let plan = self.plan.lock().clone();
        match plan {
            Some(Ok(text)) => Ok(Completion { text, origin: "fake".to_string() }),
            Some(Err(error)) => Err(error),
            None => Err(StrategyError::Unavailable("no plan scripted".to_string())),
        }
    }
}

/// Local model answering every prompt from a closure, after an optional delay.
pub struct FakeModel {
    name: String,
    readiness: Readiness,
    delay: Duration,
    reply: Box<dyn Fn(&str) -> Result<String, StrategyError> + Send + Sync>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new(
        name: &str,
        reply: impl Fn(&str) -> Result<String, StrategyError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            readiness: Readiness::Ready,
            delay: Duration::ZERO,
            reply: Box::new(reply),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LocalModel for FakeModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn availability(&self) -> Readiness {
        self.readiness
    }

    async fn prompt(&self, prompt: &str, _options: &CompletionOptions) -> Result<String, StrategyError> {
        self.prompts.lock().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.reply)(prompt)
    }
}

/// Reply keyed on which of the four on-device prompts this is.
pub fn study_reply(prompt: &str) -> Result<String, StrategyError> {
    if prompt.contains("primary human language") {
        Ok("Spanish - the transcript is in Spanish".to_string())
    } else if prompt.contains("multiple-choice") {
        let items: Vec<_> = (0..3).map(|i| quiz_item(&format!("Pregunta {}?", i), json!("A"))).collect();
        Ok(format!("```json\n{}\n```", serde_json::to_string(&items).unwrap_or_default()))
    } else if prompt.contains("Quick Diagnostic") {
        Ok("1. Review notes\n2. Retake quiz".to_string())
    } else {
        Ok("## Apuntes\n- idea".to_string())
    }
}
