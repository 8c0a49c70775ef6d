// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! `generate` subcommand: study material for a transcript file.

use std::path::{Path, PathBuf};

use super::{load_settings, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
use crate::config::EnvConfig;
use crate::generation::{GenerationError, GenerationInput, GenerationOutcome};
use crate::study::export_plain_text;
use crate::transcript::Transcript;
use crate::{Runtime, RuntimeConfig};

/// Parsed `generate` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateArgs {
    pub transcript_path: PathBuf,
    pub source_url: String,
    pub title: String,
    pub force: bool,
    pub json: bool,
    pub export_path: Option<PathBuf>,
}

/// Parse the arguments following `generate`.
pub fn parse_generate_args(args: &[String]) -> Result<GenerateArgs, String> {
    let mut parsed = GenerateArgs::default();
    let mut transcript_path = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--url" | "--title" | "--export" => {
                let flag = args[i].as_str();
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("Missing value for {}", flag))?
                    .clone();
                match flag {
                    "--url" => parsed.source_url = value,
                    "--title" => parsed.title = value,
                    _ => parsed.export_path = Some(PathBuf::from(value)),
                }
                i += 2;
            }
            "--force" => {
                parsed.force = true;
                i += 1;
            }
            "--json" => {
                parsed.json = true;
                i += 1;
            }
            other if other.starts_with("--") => return Err(format!("Unknown argument: {}", other)),
            path => {
                if transcript_path.is_some() {
                    return Err(format!("Unexpected argument: {}", path));
                }
                transcript_path = Some(PathBuf::from(path));
                i += 1;
            }
        }
    }
    parsed.transcript_path = transcript_path.ok_or("Missing transcript file")?;
    if parsed.source_url.is_empty() {
        parsed.source_url = format!("file://{}", parsed.transcript_path.display());
    }
    Ok(parsed)
}

/// Read a transcript file: a JSON array of `{start_offset_secs, text}`
/// segments, or plain text.
pub fn read_transcript(path: &Path) -> Result<Transcript, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read transcript {}: {}", path.display(), e))?;
    if raw.trim_start().starts_with('[') {
        if let Ok(transcript @ Transcript::Segments(_)) = serde_json::from_str::<Transcript>(&raw) {
            return Ok(transcript);
        }
    }
    Ok(Transcript::Text(raw))
}

/// Run `generate`.
///
/// Returns 0 on success, 1 when every strategy failed, 2 on bad input.
pub async fn run_generate(env: &EnvConfig, args: &[String]) -> i32 {
    let args = match parse_generate_args(args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: lectern-cli generate <TRANSCRIPT> [--url URL] [--title TITLE] [--force] [--json] [--export FILE]");
            return EXIT_USAGE;
        }
    };
    let settings = match load_settings(env) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid settings: {}", e);
            return EXIT_USAGE;
        }
    };
    let transcript = match read_transcript(&args.transcript_path) {
        Ok(transcript) => transcript,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_USAGE;
        }
    };
    let runtime = match Runtime::new(RuntimeConfig::from(env), Vec::new()) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let input = GenerationInput {
        transcript,
        title: args.title.clone(),
        source_url: args.source_url.clone(),
        content_id: None,
    };
    match runtime.orchestrator.generate(&input, &settings, args.force).await {
        Ok(outcome) => emit(&outcome, &args),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(e: &GenerationError) -> i32 {
    if e.is_input_error() {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}

fn emit(outcome: &GenerationOutcome, args: &GenerateArgs) -> i32 {
    if args.json {
        match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else {
        println!("{}", status_line(outcome));
        println!();
        println!("{}", export_plain_text(&outcome.result));
    }

    if let Some(path) = &args.export_path {
        if let Err(e) = std::fs::write(path, export_plain_text(&outcome.result)) {
            eprintln!("Cannot write export {}: {}", path.display(), e);
            return EXIT_FAILURE;
        }
    }
    EXIT_OK
}

/// One-line summary: "Ready • 412 words • English • Remote server • Server • Fresh".
pub fn status_line(outcome: &GenerationOutcome) -> String {
    let result = &outcome.result;
    let provenance = &outcome.provenance;
    let mut bits = vec!["Ready".to_string()];
    if result.source_word_count > 0 {
        bits.push(format!("{} words", result.source_word_count));
    }
    if !result.source_language.is_empty() {
        bits.push(result.source_language.clone());
    }
    bits.push(provenance.origin_label.clone());
    bits.push(provenance.status_label.clone());
    bits.push(provenance.cache_label.clone());
    bits.join(" \u{2022} ")
}
