// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Where a result came from and how old it is.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::strategy::StrategyKind;

/// Cache side of a result's provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheState {
    /// Generated now, cache consulted first.
    Fresh,
    /// Generated now on a forced refresh.
    Refreshed,
    /// Served from cache.
    Cached { saved_at: DateTime<Utc> },
}

impl CacheState {
    /// Human label, with the entry's age relative to `now` for cached results.
    pub fn label(&self, now: DateTime<Utc>) -> String {
        match self {
            Self::Fresh => "Fresh".to_string(),
            Self::Refreshed => "Refreshed now".to_string(),
            Self::Cached { saved_at } => format!("Cached {}", format_relative_age(*saved_at, now)),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

/// Provenance reported alongside every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub origin_label: String,
    pub cache_state: CacheState,
    pub cache_label: String,
    pub status_label: String,
    /// True when a study plan was filled in by a supplemental call.
    pub supplemented: bool,
    pub elapsed_ms: u64,
}

const COACH_SUFFIX: &str = " + Coach";
const COACH_ORIGIN_SUFFIX: &str = " + on-device coach";

pub(crate) fn fresh_status_label(kind: StrategyKind, supplemented: bool) -> String {
    let base = match kind {
        StrategyKind::OnDevice => "On-device",
        StrategyKind::Remote => "Server",
    };
    with_suffix(base, supplemented, COACH_SUFFIX)
}

pub(crate) fn cached_status_label(supplemented: bool) -> String {
    with_suffix("Cached", supplemented, COACH_SUFFIX)
}

/// Origin label once a supplemental plan has been merged in.
pub(crate) fn supplemented_origin(origin: &str) -> String {
    if origin.ends_with(COACH_ORIGIN_SUFFIX) {
        origin.to_string()
    } else {
        format!("{}{}", origin, COACH_ORIGIN_SUFFIX)
    }
}

fn with_suffix(base: &str, apply: bool, suffix: &str) -> String {
    if apply {
        format!("{}{}", base, suffix)
    } else {
        base.to_string()
    }
}

/// Coarse relative age: "moments ago", "5 min ago", "3 hr ago", "2 days ago".
pub fn format_relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let ms = now.signed_duration_since(then).num_milliseconds().max(0);
    const MIN: i64 = 60_000;
    const HOUR: i64 = 60 * MIN;
    const DAY: i64 = 24 * HOUR;

    if ms < 45_000 {
        "moments ago".to_string()
    } else if ms < 90_000 {
        "1 min ago".to_string()
    } else if ms < HOUR {
        format!("{} min ago", round_div(ms, MIN))
    } else if ms < 2 * HOUR {
        "1 hr ago".to_string()
    } else if ms < DAY {
        format!("{} hr ago", round_div(ms, HOUR))
    } else {
        let days = round_div(ms, DAY);
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}

fn round_div(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn age(d: Duration) -> String {
        let now = Utc::now();
        format_relative_age(now - d, now)
    }

    #[test]
    fn test_relative_age_thresholds() {
        assert_eq!(age(Duration::seconds(10)), "moments ago");
        assert_eq!(age(Duration::seconds(60)), "1 min ago");
        assert_eq!(age(Duration::minutes(14)), "14 min ago");
        assert_eq!(age(Duration::minutes(59)), "59 min ago");
        assert_eq!(age(Duration::minutes(90)), "1 hr ago");
        assert_eq!(age(Duration::hours(5)), "5 hr ago");
        assert_eq!(age(Duration::hours(30)), "1 day ago");
        assert_eq!(age(Duration::days(3)), "3 days ago");
    }

    #[test]
    fn test_future_timestamp_is_moments_ago() {
        let now = Utc::now();
        assert_eq!(format_relative_age(now + Duration::seconds(30), now), "moments ago");
    }

    #[test]
    fn test_labels() {
        assert_eq!(fresh_status_label(StrategyKind::Remote, true), "Server + Coach");
        assert_eq!(fresh_status_label(StrategyKind::OnDevice, false), "On-device");
        assert_eq!(cached_status_label(true), "Cached + Coach");
        assert_eq!(supplemented_origin("Remote server"), "Remote server + on-device coach");
        assert_eq!(
            supplemented_origin("Remote server + on-device coach"),
            "Remote server + on-device coach"
        );
    }

    #[test]
    fn test_cache_state_labels() {
        let now = Utc::now();
        assert_eq!(CacheState::Fresh.label(now), "Fresh");
        assert_eq!(CacheState::Refreshed.label(now), "Refreshed now");
        assert_eq!(
            CacheState::Cached { saved_at: now - chrono::Duration::hours(3) }.label(now),
            "Cached 3 hr ago"
        );
    }
}
