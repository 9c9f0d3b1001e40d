//! In-memory target registry.
//!
//! Owns every [`Target`] record. The URL is the internal key; all
//! user-facing operations resolve by service name. A single coarse lock
//! guards the map — cardinality is small (tens to low hundreds of
//! targets), hold times are short, and nothing does I/O under the lock.
//! Callers always receive cloned snapshots, never live references.

mod models;

pub use models::*;

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::config::LATENCY_WINDOW;

/// Result of one completed check, as written back by the probe executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckOutcome {
    /// The request completed; any status code counts, 5xx included.
    Up { status: u16, latency: Option<f64> },
    /// Every attempt failed at the transport level.
    Down,
}

/// State transition summary returned by [`Registry::record_outcome`].
///
/// The alert engine consumes this instead of re-reading the target: a
/// successful outcome clears the alert latch in the same critical section,
/// so `recovered` is the only reliable signal that a recovery happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeSummary {
    /// Post-update consecutive failure count
    pub consecutive_failures: u32,
    /// Post-update latch state
    pub alert_latched: bool,
    /// True when this success cleared a previously set latch
    pub recovered: bool,
}

/// Thread-safe registry of monitored targets.
pub struct Registry {
    targets: Mutex<HashMap<String, Target>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new target. Fails when the URL is already monitored or
    /// the name collides case-insensitively with an existing target.
    pub fn register(&self, name: &str, url: &str) -> bool {
        let mut targets = self.targets.lock().unwrap();

        if targets.contains_key(url) {
            tracing::warn!("Duplicate URL attempt: {}", url);
            return false;
        }

        if find_by_name(&targets, name).is_some() {
            tracing::warn!("Duplicate service name attempt: {}", name);
            return false;
        }

        targets.insert(url.to_string(), Target::new(name, url));
        tracing::info!("Monitoring started | {} -> {}", name, url);
        true
    }

    /// Remove a target by name. False if not found.
    pub fn remove_by_name(&self, name: &str) -> bool {
        let mut targets = self.targets.lock().unwrap();

        let Some(url) = find_by_name(&targets, name).map(|t| t.url.clone()) else {
            return false;
        };

        targets.remove(&url);
        tracing::info!("Monitoring removed | {}", name);
        true
    }

    /// Pause probing for a target. False if not found.
    pub fn pause_by_name(&self, name: &str) -> bool {
        self.set_paused(name, true)
    }

    /// Resume probing for a target. False if not found.
    pub fn resume_by_name(&self, name: &str) -> bool {
        self.set_paused(name, false)
    }

    fn set_paused(&self, name: &str, paused: bool) -> bool {
        let mut targets = self.targets.lock().unwrap();

        let Some(url) = find_by_name(&targets, name).map(|t| t.url.clone()) else {
            return false;
        };

        if let Some(target) = targets.get_mut(&url) {
            target.paused = paused;
        }
        tracing::info!(
            "Monitoring {} | {}",
            if paused { "paused" } else { "resumed" },
            name
        );
        true
    }

    /// Snapshot of a single target by name.
    pub fn get_by_name(&self, name: &str) -> Option<Target> {
        let targets = self.targets.lock().unwrap();
        find_by_name(&targets, name).cloned()
    }

    /// Snapshot of a single target by its URL key.
    pub fn get_by_url(&self, url: &str) -> Option<Target> {
        let targets = self.targets.lock().unwrap();
        targets.get(url).cloned()
    }

    /// Snapshot of all targets.
    pub fn list_all(&self) -> Vec<Target> {
        let targets = self.targets.lock().unwrap();
        targets.values().cloned().collect()
    }

    /// Number of monitored targets.
    pub fn len(&self) -> usize {
        self.targets.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.lock().unwrap().is_empty()
    }

    /// Write back the outcome of one check.
    ///
    /// Updates status, counters and the latency window in one critical
    /// section and returns the transition summary the alert engine needs.
    /// No-op (returns `None`) when the URL is unknown, e.g. the target was
    /// removed while its probe was in flight.
    pub fn record_outcome(&self, url: &str, outcome: CheckOutcome) -> Option<OutcomeSummary> {
        let mut targets = self.targets.lock().unwrap();
        let target = targets.get_mut(url)?;

        target.last_checked = Some(Utc::now());
        target.total_checks += 1;

        let mut recovered = false;
        match outcome {
            CheckOutcome::Up { status, latency } => {
                target.last_status = Some(CheckStatus::Http(status));
                target.consecutive_failures = 0;
                target.successful_checks += 1;
                if target.alert_latched {
                    target.alert_latched = false;
                    recovered = true;
                }
                if let Some(latency) = latency {
                    target.recent_latencies.push_back(latency);
                    while target.recent_latencies.len() > LATENCY_WINDOW {
                        target.recent_latencies.pop_front();
                    }
                }
            }
            CheckOutcome::Down => {
                target.last_status = Some(CheckStatus::Down);
                target.consecutive_failures += 1;
            }
        }

        Some(OutcomeSummary {
            consecutive_failures: target.consecutive_failures,
            alert_latched: target.alert_latched,
            recovered,
        })
    }

    /// Mark that a DOWN alert was sent for this target.
    ///
    /// Only the alert engine calls this, after a successful send; the
    /// latch is cleared by the next successful check in
    /// [`Registry::record_outcome`].
    pub fn latch_alert(&self, url: &str) {
        let mut targets = self.targets.lock().unwrap();
        if let Some(target) = targets.get_mut(url) {
            target.alert_latched = true;
        }
    }

    /// Zero the counters and latency history for a target, leaving
    /// identity, pause flag and alert latch untouched. False if not found.
    pub fn reset_metrics(&self, name: &str) -> bool {
        let mut targets = self.targets.lock().unwrap();

        let Some(url) = find_by_name(&targets, name).map(|t| t.url.clone()) else {
            return false;
        };

        if let Some(target) = targets.get_mut(&url) {
            target.total_checks = 0;
            target.successful_checks = 0;
            target.consecutive_failures = 0;
            target.recent_latencies.clear();
        }
        true
    }

    /// Uptime as a percentage of successful checks, 0.0 with no data.
    pub fn uptime_percentage(&self, name: &str) -> f64 {
        let targets = self.targets.lock().unwrap();
        match find_by_name(&targets, name) {
            Some(t) if t.total_checks > 0 => {
                (t.successful_checks as f64 / t.total_checks as f64) * 100.0
            }
            _ => 0.0,
        }
    }

    /// Mean of the recent latency window in seconds, 0.0 with no data.
    pub fn average_latency(&self, name: &str) -> f64 {
        let targets = self.targets.lock().unwrap();
        match find_by_name(&targets, name) {
            Some(t) if !t.recent_latencies.is_empty() => {
                t.recent_latencies.iter().sum::<f64>() / t.recent_latencies.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Replace the registry contents wholesale.
    ///
    /// Load-side hook for future persistence; the save side is a
    /// [`Registry::list_all`] snapshot. No storage backend is wired up.
    pub fn restore(&self, loaded: Vec<Target>) {
        let mut targets = self.targets.lock().unwrap();
        targets.clear();
        for target in loaded {
            targets.insert(target.url.clone(), target);
        }
    }
}

/// Linear case-insensitive name scan. Registry size stays small, so this
/// is preferred over a second index.
fn find_by_name<'a>(targets: &'a HashMap<String, Target>, name: &str) -> Option<&'a Target> {
    targets
        .values()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}
