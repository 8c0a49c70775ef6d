// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generation orchestration: cache lookup, strategy fallback, study plan
//! supplementing, persistence and provenance.

mod error;
mod flight;
mod orchestrator;
pub mod provenance;

pub use error::{GenerationError, StrategyFailure};
pub use flight::{FlightPermit, SingleFlight};
pub use orchestrator::{GenerationInput, GenerationOutcome, GenerationState, Orchestrator};
pub use provenance::{format_relative_age, CacheState, Provenance};
