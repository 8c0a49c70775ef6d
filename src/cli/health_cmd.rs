// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! `health` subcommand: probe the remote generation server.

use super::{EXIT_CONNECTION, EXIT_FAILURE, EXIT_OK};
use crate::config::EnvConfig;
use crate::strategy::{RemoteStrategy, ServerHealth, StrategyError};

/// Run `health`.
///
/// Returns 0 when the server reports ok, 1 when it answers unhealthy,
/// 3 when it cannot be reached.
pub async fn run_health(env: &EnvConfig, json: bool) -> i32 {
    let remote = match RemoteStrategy::new(env.remote.clone()) {
        Ok(remote) => remote,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };
    let result = remote.health().await;
    report(remote.base_url(), &result, json)
}

fn report(url: &str, result: &Result<ServerHealth, StrategyError>, json: bool) -> i32 {
    match result {
        Ok(health) => {
            if json {
                match serde_json::to_string_pretty(health) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                println!("Server:  {}", url);
                println!("Status:  {}", if health.ok { "healthy" } else { "unhealthy" });
                if let Some(version) = &health.api_version {
                    println!("API:     {}", version);
                }
                if let Some(model) = &health.model {
                    println!("Model:   {}", model);
                }
            }
            if health.ok {
                EXIT_OK
            } else {
                EXIT_FAILURE
            }
        }
        Err(StrategyError::Rejected(reason)) => {
            eprintln!("Server at {} answered but is unhealthy: {}", url, reason);
            EXIT_FAILURE
        }
        Err(e) => {
            eprintln!("Error connecting to generation server at {}: {}", url, e);
            eprintln!("Is the server running? Check LECTERN_SERVER_URL.");
            EXIT_CONNECTION
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let url = "http://127.0.0.1:8000";
        let healthy = ServerHealth { ok: true, ..Default::default() };
        assert_eq!(report(url, &Ok(healthy), false), EXIT_OK);
        assert_eq!(report(url, &Ok(ServerHealth::default()), true), EXIT_FAILURE);
        assert_eq!(
            report(url, &Err(StrategyError::Rejected("HTTP 503".into())), false),
            EXIT_FAILURE
        );
        assert_eq!(
            report(url, &Err(StrategyError::Unavailable("refused".into())), false),
            EXIT_CONNECTION
        );
        assert_eq!(report(url, &Err(StrategyError::Timeout(5000)), false), EXIT_CONNECTION);
    }
}
