// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request/response bridge to an on-device model host.
//!
//! The host runs in its own task and talks to the caller only through
//! messages. Every prompt carries a correlation id; the matching reply
//! resolves it exactly once. Replies that arrive after the caller gave up
//! are dropped.
//!
//! ```text
//! BridgeClient --BridgeRequest--> host task --BridgeEvent--> pump task
//!      ^                                                        |
//!      +-------------- oneshot (looked up by id) <--------------+
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::{duration_millis, Completion, CompletionClient, CompletionOptions, Readiness, StrategyError};

pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(4500);
const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// First message from the host: what it can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAnnouncement {
    pub strategies: Vec<String>,
    pub available: bool,
}

/// Caller to host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    Prompt {
        id: Uuid,
        prompt: String,
        options: CompletionOptions,
    },
}

/// Host to caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Ready(BridgeAnnouncement),
    PromptSuccess { id: Uuid, completion: Completion },
    PromptError { id: Uuid, error: StrategyError },
}

#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// How long a caller waits for the host's announcement.
    pub ready_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ready_timeout: DEFAULT_READY_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

type Pending = Arc<DashMap<Uuid, oneshot::Sender<Result<Completion, StrategyError>>>>;

/// Start a host task serving `host` and return the caller side.
///
/// Must be called inside a tokio runtime.
pub fn spawn_bridge(host: Arc<dyn CompletionClient>, config: BridgeConfig) -> BridgeClient {
    let capacity = config.channel_capacity.max(1);
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (announce_tx, announce_rx) = watch::channel(None);
    let pending: Pending = Arc::new(DashMap::new());

    tokio::spawn(run_host(host, request_rx, event_tx));
    tokio::spawn(run_pump(event_rx, pending.clone(), announce_tx));

    BridgeClient {
        requests: request_tx,
        pending,
        announcement: announce_rx,
        ready_timeout: config.ready_timeout,
    }
}

async fn run_host(
    host: Arc<dyn CompletionClient>,
    mut requests: mpsc::Receiver<BridgeRequest>,
    events: mpsc::Sender<BridgeEvent>,
) {
    let available = host.detect_readiness().await != Readiness::Unavailable;
    let announcement = BridgeAnnouncement {
        strategies: host.backends(),
        available,
    };
    if events.send(BridgeEvent::Ready(announcement)).await.is_err() || !available {
        return;
    }

    while let Some(request) = requests.recv().await {
        let BridgeRequest::Prompt { id, prompt, options } = request;
        let host = host.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let event = match host.run_completion(&prompt, &options).await {
                Ok(completion) => BridgeEvent::PromptSuccess { id, completion },
                Err(error) => BridgeEvent::PromptError { id, error },
            };
            let _ = events.send(event).await;
        });
    }
}

async fn run_pump(
    mut events: mpsc::Receiver<BridgeEvent>,
    pending: Pending,
    announce: watch::Sender<Option<BridgeAnnouncement>>,
) {
    while let Some(event) = events.recv().await {
        let (id, result) = match event {
            BridgeEvent::Ready(announcement) => {
                tracing::debug!(
                    strategies = ?announcement.strategies,
                    available = announcement.available,
                    "on-device bridge ready"
                );
                announce.send_replace(Some(announcement));
                continue;
            }
            BridgeEvent::PromptSuccess { id, completion } => (id, Ok(completion)),
            BridgeEvent::PromptError { id, error } => (id, Err(error)),
        };
        match pending.remove(&id) {
            Some((_, waiter)) => {
                let _ = waiter.send(result);
            }
            None => tracing::debug!(%id, "late bridge reply dropped"),
        }
    }
    // Host gone: fail everything still waiting.
    pending.clear();
}

/// Caller side of the bridge.
pub struct BridgeClient {
    requests: mpsc::Sender<BridgeRequest>,
    pending: Pending,
    announcement: watch::Receiver<Option<BridgeAnnouncement>>,
    ready_timeout: Duration,
}

impl BridgeClient {
    /// Host announcement, waiting up to the ready timeout for it.
    pub async fn wait_ready(&self) -> Option<BridgeAnnouncement> {
        let mut rx = self.announcement.clone();
        let announced = async move {
            let seen = rx.wait_for(Option::is_some).await.map(|a| Option::clone(&a));
            seen.ok().flatten()
        };
        tokio::time::timeout(self.ready_timeout, announced).await.ok().flatten()
    }

    /// Requests awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl CompletionClient for BridgeClient {
    fn name(&self) -> &str {
        "on-device bridge"
    }

    fn backends(&self) -> Vec<String> {
        self.announcement
            .borrow()
            .as_ref()
            .map(|a| a.strategies.clone())
            .unwrap_or_default()
    }

    async fn detect_readiness(&self) -> Readiness {
        match self.wait_ready().await {
            Some(a) if a.available => Readiness::Ready,
            _ => Readiness::Unavailable,
        }
    }

    async fn run_completion(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, StrategyError> {
        match self.wait_ready().await {
            Some(a) if a.available => {}
            Some(_) => return Err(StrategyError::Unavailable("on-device AI unavailable".into())),
            None => return Err(StrategyError::Unavailable("on-device bridge never became ready".into())),
        }

        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let request = BridgeRequest::Prompt {
            id,
            prompt: prompt.to_string(),
            options: options.clone(),
        };
        if self.requests.send(request).await.is_err() {
            self.pending.remove(&id);
            return Err(StrategyError::Unavailable("on-device bridge closed".into()));
        }

        match tokio::time::timeout(options.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(StrategyError::Unavailable("on-device bridge dropped the request".into())),
            Err(_) => {
                self.pending.remove(&id);
                Err(StrategyError::Timeout(duration_millis(options.timeout)))
            }
        }
    }
}
