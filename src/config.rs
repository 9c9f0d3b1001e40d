//! Configuration module for sitewatch.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values below their documented minimum are clamped with a warning rather
//! than rejected, so a misconfigured deployment still comes up.

use std::env;

/// Rolling window length for per-target latency history.
pub const LATENCY_WINDOW: usize = 20;

/// Monitoring engine configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between scheduler cycles, in seconds (default: 60, minimum: 10)
    pub check_interval: u64,
    /// Per-attempt network timeout, in seconds (default: 10, minimum: 5)
    pub request_timeout: u64,
    /// Consecutive failures before a DOWN alert (default: 3, minimum: 1)
    pub alert_failure_threshold: u32,
    /// Webhook URL for alert delivery; `None` disables all alerting
    pub alert_webhook: Option<String>,
    /// Shared limiter capacity for in-flight probes (default: 10)
    pub max_concurrent_probes: usize,
    /// Retries per probe after the initial attempt (default: 2)
    pub max_retries: u32,
    /// Exponential backoff base; retry delay is base^attempt seconds
    pub retry_backoff_base: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: 60,
            request_timeout: 10,
            alert_failure_threshold: 3,
            alert_webhook: None,
            max_concurrent_probes: 10,
            max_retries: 2,
            retry_backoff_base: 2.0,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SITEWATCH_CHECK_INTERVAL`: seconds between cycles (default: 60, min: 10)
    /// - `SITEWATCH_REQUEST_TIMEOUT`: per-attempt timeout in seconds (default: 10, min: 5)
    /// - `SITEWATCH_ALERT_THRESHOLD`: consecutive failures before a DOWN alert (default: 3, min: 1)
    /// - `SITEWATCH_ALERT_WEBHOOK`: alert destination URL; unset or empty disables alerting
    pub fn load() -> Self {
        let mut cfg = Self::default();

        cfg.check_interval = env_u64("SITEWATCH_CHECK_INTERVAL", cfg.check_interval, 10);
        cfg.request_timeout = env_u64("SITEWATCH_REQUEST_TIMEOUT", cfg.request_timeout, 5);
        cfg.alert_failure_threshold =
            env_u64("SITEWATCH_ALERT_THRESHOLD", cfg.alert_failure_threshold as u64, 1)
                .min(u32::MAX as u64) as u32;

        if let Ok(url) = env::var("SITEWATCH_ALERT_WEBHOOK") {
            let url = url.trim();
            if !url.is_empty() {
                cfg.alert_webhook = Some(url.to_string());
            }
        }

        tracing::info!(
            "Config loaded | CHECK_INTERVAL={}s | TIMEOUT={}s | ALERT_THRESHOLD={}",
            cfg.check_interval,
            cfg.request_timeout,
            cfg.alert_failure_threshold
        );

        cfg
    }
}

/// Read an integer environment variable, falling back to `default` when
/// missing or unparseable and clamping to `min`.
fn env_u64(key: &str, default: u64, min: u64) -> u64 {
    let value = match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    "Invalid integer for {}='{}', falling back to {}",
                    key,
                    raw,
                    default
                );
                default
            }
        },
        Err(_) => default,
    };

    if value < min {
        tracing::warn!("{}={} is below minimum {}, using {}", key, value, min, min);
        return min;
    }

    value
}
