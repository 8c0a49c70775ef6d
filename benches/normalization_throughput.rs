// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Normalization and fingerprint throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use lectern_core::fingerprint::{digest, fingerprint_settings};
use lectern_core::settings::GenerationSettings;
use lectern_core::study::{normalize_quiz, parse_raw_quiz_payload};
use lectern_core::transcript::{PreparedTranscript, Transcript, TranscriptLimits};

fn model_reply(questions: usize) -> String {
    let answers = [json!("A"), json!("2"), json!("third"), json!(1)];
    let items: Vec<_> = (0..questions)
        .map(|i| {
            json!({
                "question": format!("Question {}?", i),
                "options": ["first", "second", "third", "fourth"],
                "correct_index": answers[i % 4].clone(),
                "explanation": "Stated in the lecture.",
            })
        })
        .collect();
    format!("Here is your quiz:\n```json\n{}\n```", json!(items))
}

fn bench_parse_quiz_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_raw_quiz_payload");

    for count in [5usize, 12, 50] {
        let reply = model_reply(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(BenchmarkId::new("questions", count), |b| {
            b.iter(|| parse_raw_quiz_payload(black_box(&reply)))
        });
    }

    group.finish();
}

fn bench_normalize_values(c: &mut Criterion) {
    let items: Vec<_> = (0..12)
        .map(|i| {
            json!({
                "prompt": format!("Q{}", i),
                "choices": ["a", "b", "c", "d"],
                "answer": "D",
            })
        })
        .collect();

    c.bench_function("normalize_quiz_12", |b| b.iter(|| normalize_quiz(black_box(&items))));
}

fn bench_fingerprints(c: &mut Criterion) {
    let settings = GenerationSettings::default();
    c.bench_function("fingerprint_settings", |b| {
        b.iter(|| fingerprint_settings(black_box(&settings)))
    });

    let mut group = c.benchmark_group("transcript_prepare");
    for words in [500usize, 3200, 10_000] {
        let transcript = Transcript::Text("lecture ".repeat(words));
        group.throughput(Throughput::Elements(words as u64));
        group.bench_function(BenchmarkId::new("words", words), |b| {
            b.iter(|| PreparedTranscript::prepare(black_box(&transcript), TranscriptLimits::default()))
        });
    }
    group.finish();

    let text = "word ".repeat(3200);
    c.bench_function("digest_3200_words", |b| b.iter(|| digest(black_box(&text))));
}

criterion_group!(benches, bench_parse_quiz_reply, bench_normalize_values, bench_fingerprints);
criterion_main!(benches);
