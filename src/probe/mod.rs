//! Probe executor: one health check against a single target.
//!
//! A probe is up to `max_retries + 1` sequential attempts with exponential
//! backoff, gated by the shared concurrency limiter. Transport-level
//! failures (timeout, connection refusal, other network errors) are the
//! only thing that counts as a failed attempt; any completed HTTP response
//! is a success regardless of status code.

mod http;

pub use http::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::alert::AlertEngine;
use crate::config::MonitorConfig;
use crate::registry::{CheckOutcome, Registry, Target};

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Per-probe tuning, shared by every probe in a cycle.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Hard per-attempt timeout
    pub timeout: Duration,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Retry delay is `backoff_base ^ attempt` seconds
    pub backoff_base: f64,
}

impl From<&MonitorConfig> for ProbeSettings {
    fn from(cfg: &MonitorConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.request_timeout),
            max_retries: cfg.max_retries,
            backoff_base: cfg.retry_backoff_base,
        }
    }
}

/// Outcome of a single network attempt.
enum AttemptResult {
    Success { status: u16, latency: f64 },
    TransportFailure(ProbeError),
}

/// Run one attempt under a hard timeout and classify the result.
async fn run_attempt(prober: &dyn HttpProber, url: &str, timeout: Duration) -> AttemptResult {
    let start = Instant::now();

    match tokio::time::timeout(timeout, prober.get(url, timeout)).await {
        Ok(Ok(status)) => {
            let latency = (start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
            AttemptResult::Success { status, latency }
        }
        Ok(Err(e)) => AttemptResult::TransportFailure(e),
        Err(_) => AttemptResult::TransportFailure(ProbeError::Timeout(timeout)),
    }
}

/// Check one target and write the outcome back to the registry.
///
/// Paused targets return immediately with no registry write and no alert
/// evaluation. Otherwise the probe holds a limiter permit for its whole
/// lifetime, including retries; the permit is released on every exit path.
pub async fn check_target(
    target: Target,
    registry: Arc<Registry>,
    alerts: Arc<AlertEngine>,
    prober: Arc<dyn HttpProber>,
    limiter: Arc<Semaphore>,
    settings: ProbeSettings,
) {
    if target.paused {
        tracing::debug!("Skipped paused service: {}", target.name);
        return;
    }

    let _permit = match limiter.acquire().await {
        Ok(permit) => permit,
        Err(_) => return, // limiter closed, shutting down
    };

    // Jitter to avoid thundering herd
    let jitter = rand::random::<u64>() % 100;
    tokio::time::sleep(Duration::from_millis(jitter)).await;

    let attempts = settings.max_retries + 1;

    for attempt in 1..=attempts {
        match run_attempt(prober.as_ref(), &target.url, settings.timeout).await {
            AttemptResult::Success { status, latency } => {
                tracing::info!("UP | {} | {} | {}s", target.name, status, latency);

                let outcome = CheckOutcome::Up {
                    status,
                    latency: Some(latency),
                };
                if let Some(summary) = registry.record_outcome(&target.url, outcome) {
                    alerts.evaluate(&registry, &target.url, &summary).await;
                }
                return;
            }
            AttemptResult::TransportFailure(ProbeError::Timeout(_)) => {
                tracing::warn!("Timeout | {}", target.name);
            }
            AttemptResult::TransportFailure(e) => {
                tracing::warn!("HTTP error | {} | {}", target.name, e);
            }
        }

        if attempt < attempts {
            let delay = settings.backoff_base.powi(attempt as i32);
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }

    tracing::error!("DOWN | {} | retries exhausted", target.name);

    if let Some(summary) = registry.record_outcome(&target.url, CheckOutcome::Down) {
        alerts.evaluate(&registry, &target.url, &summary).await;
    }
}
