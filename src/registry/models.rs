//! Registry model types.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent check, as seen by the probe layer.
///
/// `Http` carries whatever status code the endpoint returned; a completed
/// response is a transport-level success even when the code is 5xx. `Down`
/// means no attempt could complete at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Http(u16),
    Down,
}

/// User-facing status badge for a target.
///
/// Distinct from transport health on purpose: a reachable endpoint that
/// answers with HTTP >= 400 displays as `Down` here while the probe layer
/// still counts the check as successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Up,
    Down,
    Paused,
    Unknown,
}

/// One monitored endpoint and its accumulated state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// User-facing identifier, unique case-insensitively
    pub name: String,
    /// Canonical normalized endpoint, the internal primary key
    pub url: String,
    /// Paused targets are skipped by the probe executor
    pub paused: bool,
    pub last_status: Option<CheckStatus>,
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    /// True while a DOWN alert has been sent and not yet cleared by recovery
    pub alert_latched: bool,
    pub total_checks: u64,
    pub successful_checks: u64,
    /// Most recent latency samples in seconds, oldest first
    pub recent_latencies: VecDeque<f64>,
    pub created_at: DateTime<Utc>,
}

impl Target {
    /// Create a fresh target with all counters zeroed.
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            paused: false,
            last_status: None,
            last_checked: None,
            consecutive_failures: 0,
            alert_latched: false,
            total_checks: 0,
            successful_checks: 0,
            recent_latencies: VecDeque::new(),
            created_at: Utc::now(),
        }
    }

    /// Status badge for display surfaces.
    pub fn display_state(&self) -> DisplayState {
        if self.paused {
            return DisplayState::Paused;
        }
        match self.last_status {
            Some(CheckStatus::Http(code)) if code < 400 => DisplayState::Up,
            Some(_) => DisplayState::Down,
            None => DisplayState::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_target_is_zeroed() {
        let t = Target::new("Main Website", "https://example.com");
        assert_eq!(t.total_checks, 0);
        assert_eq!(t.successful_checks, 0);
        assert_eq!(t.consecutive_failures, 0);
        assert!(!t.paused);
        assert!(!t.alert_latched);
        assert!(t.last_status.is_none());
        assert!(t.recent_latencies.is_empty());
    }

    #[test]
    fn test_display_state_badges() {
        let mut t = Target::new("svc", "https://example.com");
        assert_eq!(t.display_state(), DisplayState::Unknown);

        t.last_status = Some(CheckStatus::Http(200));
        assert_eq!(t.display_state(), DisplayState::Up);

        // Transport success, but the badge shows down for >= 400.
        t.last_status = Some(CheckStatus::Http(503));
        assert_eq!(t.display_state(), DisplayState::Down);

        t.last_status = Some(CheckStatus::Down);
        assert_eq!(t.display_state(), DisplayState::Down);

        t.paused = true;
        assert_eq!(t.display_state(), DisplayState::Paused);
    }
}
