// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Assembled runtime: file-backed cache, bridge-hosted local model, remote fallback.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{study_reply, words, FakeModel};
use lectern_core::config::CacheLocation;
use lectern_core::generation::{GenerationError, GenerationInput};
use lectern_core::settings::GenerationSettings;
use lectern_core::strategy::{LocalModel, RemoteConfig};
use lectern_core::transcript::Transcript;
use lectern_core::{Runtime, RuntimeConfig};

/// Config whose remote server refuses connections.
fn config(dir: &std::path::Path) -> RuntimeConfig {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);
    RuntimeConfig {
        remote: RemoteConfig {
            base_url: format!("http://{}", addr),
            timeout: Duration::from_secs(2),
            health_timeout: Duration::from_secs(1),
        },
        cache_location: CacheLocation {
            dir: dir.to_path_buf(),
            namespace: "test-cache".to_string(),
        },
        ..Default::default()
    }
}

fn input() -> GenerationInput {
    GenerationInput {
        transcript: Transcript::Text(words(60, "concept")),
        title: "Seminar".into(),
        source_url: "https://www.youtube.com/watch?v=seminar1".into(),
        content_id: None,
    }
}

#[tokio::test]
async fn test_local_generation_cached_across_runtimes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = GenerationSettings { num_questions: 3, ..Default::default() };

    let model = Arc::new(FakeModel::new("gemini-nano", study_reply));
    let runtime = Runtime::new(config(dir.path()), vec![model.clone() as Arc<dyn LocalModel>]).unwrap();
    assert!(runtime.bridge.is_some());

    let first = runtime.orchestrator.generate(&input(), &settings, false).await.unwrap();
    assert_eq!(first.provenance.origin_label, "On-device (gemini-nano)");
    assert!(first.result.has_study_plan());
    assert!(dir.path().join("test-cache.json").exists());
    let prompts_after_first = model.prompts().len();

    let second_model = Arc::new(FakeModel::new("gemini-nano", study_reply));
    let reopened =
        Runtime::new(config(dir.path()), vec![second_model.clone() as Arc<dyn LocalModel>]).unwrap();
    let second = reopened.orchestrator.generate(&input(), &settings, false).await.unwrap();
    assert!(second.provenance.cache_state.is_cached());
    assert_eq!(second.result, first.result);
    assert!(second_model.prompts().is_empty());
    assert_eq!(model.prompts().len(), prompts_after_first);
}

#[tokio::test]
async fn test_remote_only_with_unreachable_server() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(config(dir.path()), Vec::new()).unwrap();
    assert!(runtime.bridge.is_none());

    let settings = GenerationSettings { prefer_local: false, ..Default::default() };
    let err = runtime.orchestrator.generate(&input(), &settings, false).await.unwrap_err();
    match err {
        GenerationError::Exhausted { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].strategy, "remote");
            assert!(failures[0].reason.starts_with("unavailable"), "{}", failures[0].reason);
        }
        other => panic!("expected exhaustion, got {}", other),
    }
    assert!(!dir.path().join("test-cache.json").exists());
}
