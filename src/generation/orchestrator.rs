// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generation state machine.
//!
//! ```text
//! Idle -> LookingUpCache -> CacheHit ----------> Supplementing -> Done
//!                        \-> Generating -------> Supplementing -> Persisting -> Done
//!                     (any non-terminal state) -> Failed
//! ```
//!
//! Cache read happens before any strategy call, which happens before the
//! cache write. Strategies run one at a time, never raced.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::error::{GenerationError, StrategyFailure};
use super::flight::SingleFlight;
use super::provenance::{
    cached_status_label, fresh_status_label, supplemented_origin, CacheState, Provenance,
};
use crate::cache::{CacheEntry, CacheStore};
use crate::fingerprint::{cache_key, content_id_from_locator, fingerprint_settings, CacheKey};
use crate::settings::GenerationSettings;
use crate::strategy::{duration_millis, GenerationRequest, GenerationStrategy, StrategyKind};
use crate::study::{normalize_payload, CanonicalResult};
use crate::telemetry::{self, CacheLookup, GenerationSpan, SpanExt};
use crate::transcript::{PreparedTranscript, Transcript, TranscriptLimits};

/// Where the current (or last) generation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Idle,
    LookingUpCache,
    CacheHit,
    Generating,
    Supplementing,
    Persisting,
    Done,
    Failed,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Source material for one generation.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub transcript: Transcript,
    pub title: String,
    pub source_url: String,
    /// Natural content id; derived from `source_url` when absent.
    pub content_id: Option<String>,
}

/// A canonical result plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    pub result: CanonicalResult,
    pub provenance: Provenance,
    pub cache_key: CacheKey,
}

/// Sequences cache lookup, strategy fallback, supplementing and persisting.
///
/// One orchestrator per execution context; it admits one generation at a time.
pub struct Orchestrator {
    cache: Arc<CacheStore>,
    strategies: Vec<Arc<dyn GenerationStrategy>>,
    limits: TranscriptLimits,
    flight: SingleFlight,
    state: Mutex<GenerationState>,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<CacheStore>,
        strategies: Vec<Arc<dyn GenerationStrategy>>,
        limits: TranscriptLimits,
    ) -> Self {
        Self {
            cache,
            strategies,
            limits,
            flight: SingleFlight::new(),
            state: Mutex::new(GenerationState::Idle),
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn state(&self) -> GenerationState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    fn set_state(&self, next: GenerationState) {
        let mut state = self.state.lock();
        tracing::debug!(from = ?*state, to = ?next, "generation state");
        *state = next;
    }

    /// Strategies to try, in order.
    ///
    /// On-device first when local generation is preferred, remote only
    /// otherwise. A strategy whose name matches the explicit preference
    /// moves to the front of whatever is allowed.
    pub fn strategy_order(&self, settings: &GenerationSettings) -> Vec<Arc<dyn GenerationStrategy>> {
        let mut order: Vec<Arc<dyn GenerationStrategy>> = Vec::new();
        if settings.prefer_local {
            order.extend(
                self.strategies
                    .iter()
                    .filter(|s| s.kind() == StrategyKind::OnDevice)
                    .cloned(),
            );
        }
        order.extend(
            self.strategies
                .iter()
                .filter(|s| s.kind() == StrategyKind::Remote)
                .cloned(),
        );
        if let Some(preferred) = settings.strategy_preference.preferred_name() {
            order.sort_by_key(|s| s.name() != preferred);
        }
        order
    }

    /// Run one generation.
    ///
    /// Refused with [`GenerationError::Busy`] while another is in flight.
    pub async fn generate(
        &self,
        input: &GenerationInput,
        settings: &GenerationSettings,
        force: bool,
    ) -> Result<GenerationOutcome, GenerationError> {
        let _permit = self.flight.try_acquire().ok_or(GenerationError::Busy)?;
        let started = Instant::now();
        self.set_state(GenerationState::Idle);

        let prepared = settings
            .validate()
            .map_err(GenerationError::from)
            .and_then(|_| PreparedTranscript::prepare(&input.transcript, self.limits).map_err(GenerationError::from));
        let transcript = match prepared {
            Ok(transcript) => transcript,
            Err(e) => {
                self.set_state(GenerationState::Failed);
                tracing::warn!(error = %e, "generation input rejected");
                return Err(e);
            }
        };

        let content_id = input
            .content_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| content_id_from_locator(&input.source_url));
        let fingerprint = fingerprint_settings(settings);
        let key = cache_key(&content_id, &fingerprint);
        let request = GenerationRequest {
            transcript,
            title: input.title.clone(),
            source_url: input.source_url.clone(),
            settings: settings.clone(),
        };

        let span = GenerationSpan::new(&key.content_id, fingerprint.as_str());
        let result = self
            .run(&key, &request, force, started)
            .instrument(span.clone())
            .await;

        span.record_result(&result);
        span.record("latency_ms", duration_millis(started.elapsed()));
        match &result {
            Ok(outcome) => {
                span.record("origin", outcome.provenance.origin_label.as_str());
                span.record("cache_state", outcome.provenance.cache_label.as_str());
                self.set_state(GenerationState::Done);
            }
            Err(e) => {
                tracing::warn!(parent: &span, error = %e, "generation failed");
                self.set_state(GenerationState::Failed);
            }
        }
        result
    }

    async fn run(
        &self,
        key: &CacheKey,
        request: &GenerationRequest,
        force: bool,
        started: Instant,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.set_state(GenerationState::LookingUpCache);
        if force {
            telemetry::record_cache_lookup(CacheLookup::Bypassed);
        } else {
            match self.cache.get(key).await {
                Some(entry) if self.cache.is_valid(&entry, request.transcript.digest()) => {
                    telemetry::record_cache_lookup(CacheLookup::Hit);
                    return Ok(self.serve_cached(key, entry, request, started).await);
                }
                Some(_) => telemetry::record_cache_lookup(CacheLookup::Invalid),
                None => telemetry::record_cache_lookup(CacheLookup::Miss),
            }
        }

        self.set_state(GenerationState::Generating);
        let (kind, mut result) = self.run_strategies(request).await?;

        let mut supplemented = false;
        if !result.has_study_plan() && request.settings.prefer_local {
            self.set_state(GenerationState::Supplementing);
            if let Some(plan) = self.supplement_plan(request).await {
                result.study_plan_markdown = Some(plan);
                if kind == StrategyKind::Remote {
                    result.origin_label = supplemented_origin(&result.origin_label);
                }
                supplemented = true;
            }
        }

        self.set_state(GenerationState::Persisting);
        self.cache.put(key, request.transcript.digest(), &result).await;

        let cache_state = if force { CacheState::Refreshed } else { CacheState::Fresh };
        telemetry::record_generation(&result.origin_label, started.elapsed());
        tracing::info!(
            origin = %result.origin_label,
            questions = result.quiz.len(),
            study_plan = result.has_study_plan(),
            "generation complete"
        );
        Ok(GenerationOutcome {
            provenance: Provenance {
                origin_label: result.origin_label.clone(),
                cache_label: cache_state.label(self.cache.now()),
                cache_state,
                status_label: fresh_status_label(kind, supplemented),
                supplemented,
                elapsed_ms: duration_millis(started.elapsed()),
            },
            result,
            cache_key: key.clone(),
        })
    }

    /// Cache hit path. A supplemented plan is returned but not written back;
    /// the stored origin is reported unchanged.
    async fn serve_cached(
        &self,
        key: &CacheKey,
        entry: CacheEntry,
        request: &GenerationRequest,
        started: Instant,
    ) -> GenerationOutcome {
        self.set_state(GenerationState::CacheHit);
        let mut result = entry.payload;
        let mut supplemented = false;
        if !result.has_study_plan() && request.settings.prefer_local {
            self.set_state(GenerationState::Supplementing);
            if let Some(plan) = self.supplement_plan(request).await {
                result.study_plan_markdown = Some(plan);
                supplemented = true;
            }
        }

        let cache_state = CacheState::Cached {
            saved_at: entry.saved_at,
        };
        let cache_label = cache_state.label(self.cache.now());
        tracing::info!(key = %key, cached = %cache_label, "served from cache");
        GenerationOutcome {
            provenance: Provenance {
                origin_label: result.origin_label.clone(),
                cache_state,
                cache_label,
                status_label: cached_status_label(supplemented),
                supplemented,
                elapsed_ms: duration_millis(started.elapsed()),
            },
            result,
            cache_key: key.clone(),
        }
    }

    /// Try strategies in order until one yields a result the normalizer accepts.
    async fn run_strategies(
        &self,
        request: &GenerationRequest,
    ) -> Result<(StrategyKind, CanonicalResult), GenerationError> {
        let order = self.strategy_order(&request.settings);
        if order.is_empty() {
            return Err(GenerationError::NoStrategy);
        }

        let mut failures = Vec::new();
        for strategy in order {
            let outcome = match strategy.generate(request).await {
                Ok(raw) => normalize_payload(raw, request.transcript.word_count())
                    .map_err(|e| ("normalization", e.to_string())),
                Err(e) => Err((e.kind(), e.to_string())),
            };
            match outcome {
                Ok(result) => return Ok((strategy.kind(), result)),
                Err((kind, reason)) => {
                    tracing::warn!(strategy = strategy.name(), %reason, "strategy failed, falling back");
                    telemetry::record_strategy_failure(strategy.name(), kind);
                    failures.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        reason,
                    });
                }
            }
        }
        Err(GenerationError::Exhausted { failures })
    }

    /// One best-effort study plan call against the first on-device strategy.
    async fn supplement_plan(&self, request: &GenerationRequest) -> Option<String> {
        let strategy = self
            .strategies
            .iter()
            .find(|s| s.kind() == StrategyKind::OnDevice)?;
        match strategy.study_plan(request).await {
            Ok(plan) if !plan.text.trim().is_empty() => Some(plan.text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(strategy = strategy.name(), "study plan supplement was empty");
                None
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name(), error = %e, "study plan supplement skipped");
                None
            }
        }
    }
}
