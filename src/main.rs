// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lectern CLI entry point.
//!
//! ## Subcommands
//!
//! - `lectern-cli generate <TRANSCRIPT>` - Notes, quiz and study plan for a transcript
//! - `lectern-cli cache list|clear` - Inspect or empty the generation cache
//! - `lectern-cli health` - Probe the remote generation server (exit 0/1/3)
//! - `lectern-cli config show|defaults|validate` - Configuration

use std::process::ExitCode;

use lectern_core::cli::{cache_cmd, config_cmd, generate_cmd, health_cmd, EXIT_USAGE};
use lectern_core::config;
use lectern_core::telemetry::{init_logging, LogError};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let env = config::load();

    match init_logging(&env.logging) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => eprintln!("Logging disabled: {}", e),
    }

    match command {
        "generate" | "gen" => {
            let code = generate_cmd::run_generate(&env, &args[2..]).await;
            ExitCode::from(code as u8)
        }
        "cache" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("list");
            match subcommand {
                "list" => {
                    let code = cache_cmd::run_list(&env).await;
                    ExitCode::from(code as u8)
                }
                "clear" => {
                    let code = cache_cmd::run_clear(&env).await;
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown cache subcommand: {}", subcommand);
                    print_command_help("cache");
                    ExitCode::from(EXIT_USAGE as u8)
                }
            }
        }
        "health" => {
            let json_output = args.get(2).map(|s| s.as_str()) == Some("--json");
            let code = health_cmd::run_health(&env, json_output).await;
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let code = config_cmd::run_validate();
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::from(EXIT_USAGE as u8)
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("lectern-cli {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::from(EXIT_USAGE as u8)
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "lectern-cli - study notes, quizzes and plans from transcripts v{}

USAGE:
    lectern-cli <COMMAND> [OPTIONS]

COMMANDS:
    generate     Generate study material for a transcript file
    cache        Inspect the generation cache (list, clear)
    health       Probe the remote generation server
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

EXAMPLES:
    lectern-cli generate talk.txt --url https://youtu.be/abc
    lectern-cli generate talk.json --force --json
    lectern-cli cache list
    lectern-cli health --json
    lectern-cli config validate

ENVIRONMENT:
    LECTERN_SERVER_URL     Remote generation server (default: http://127.0.0.1:8000)
    LECTERN_CACHE_DIR      Cache directory (default: .lectern)
    LECTERN_SETTINGS_FILE  TOML generation settings
    LECTERN_LOG_LEVEL      Log filter (debug, info, warn, error)
    LECTERN_LOG_FORMAT     json or pretty

    Run `lectern-cli config defaults` for the full list.

EXIT CODES:
    0  Success / Healthy
    1  Failure / Unhealthy
    2  Usage, input or configuration error
    3  Connection error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "generate" | "gen" => {
            eprintln!(
                "lectern-cli generate - Generate study material

USAGE:
    lectern-cli generate <TRANSCRIPT> [OPTIONS]

ARGUMENTS:
    TRANSCRIPT     Plain text, or a JSON array of {{start_offset_secs, text}} segments

OPTIONS:
    --url URL      Source URL; also derives the cache content id (default: file://TRANSCRIPT)
    --title TITLE  Title passed to the generators
    --force        Skip the cache lookup and regenerate
    --json         Print the result and provenance as JSON
    --export FILE  Also write the plain-text export to FILE

DESCRIPTION:
    Serves a cached result when one is valid for the same content, settings
    and transcript. Otherwise tries on-device generation (when preferred)
    and then the remote server, and caches the first usable result.

EXIT CODES:
    0  Result produced
    1  Every strategy failed
    2  Bad arguments, settings or transcript
"
            );
        }
        "cache" => {
            eprintln!(
                "lectern-cli cache - Generation cache

USAGE:
    lectern-cli cache [list|clear]

SUBCOMMANDS:
    list   Show cached generations, newest first (default)
    clear  Remove every cached generation
"
            );
        }
        "health" => {
            eprintln!(
                "lectern-cli health - Probe the remote generation server

USAGE:
    lectern-cli health [--json]

EXIT CODES:
    0  Server is healthy
    1  Server answered but is unhealthy
    3  Connection error
"
            );
        }
        "config" => {
            eprintln!(
                "lectern-cli config - Configuration

USAGE:
    lectern-cli config [show|defaults|validate]

SUBCOMMANDS:
    show      Print the effective configuration (default)
    defaults  Print every LECTERN_* variable with its default
    validate  Check the configuration; exit 1 on warnings
"
            );
        }
        _ => {
            eprintln!("No help for unknown command: {}", command);
            print_usage();
        }
    }
}
