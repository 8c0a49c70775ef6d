// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry for the generation core.
//!
//! Structured logging through `tracing`, per-generation spans, and counters
//! through the `metrics` facade (no-ops until a recorder is installed).

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    record_cache_lookup, record_cache_write_failure, record_generation, record_strategy_failure,
    CacheLookup,
};
pub use spans::{GenerationSpan, SpanExt};
