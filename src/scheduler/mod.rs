//! Health-check scheduler.
//!
//! Period-driven loop: each cycle snapshots the registry, fans out one
//! probe per target through a shared concurrency limiter, waits for all of
//! them, then sleeps for the configured interval. The effective period is
//! therefore `check_interval + cycle duration`, not a fixed-rate clock.

mod supervisor;

pub use supervisor::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::alert::AlertEngine;
use crate::config::MonitorConfig;
use crate::probe::{check_target, HttpProber, ProbeSettings};
use crate::registry::Registry;

/// The monitoring engine's scheduling core.
pub struct Monitor {
    registry: Arc<Registry>,
    alerts: Arc<AlertEngine>,
    prober: Arc<dyn HttpProber>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(
        registry: Arc<Registry>,
        alerts: Arc<AlertEngine>,
        prober: Arc<dyn HttpProber>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            alerts,
            prober,
            config,
        }
    }

    /// Run one monitoring cycle over a snapshot of all targets.
    ///
    /// Probes run concurrently under one limiter with no ordering
    /// guarantee. A failing or panicking probe task never aborts its
    /// siblings; task errors are logged and swallowed here, the cycle's
    /// outermost safety net.
    pub async fn run_cycle(&self) {
        let targets = self.registry.list_all();
        if targets.is_empty() {
            tracing::debug!("No monitored services found");
            return;
        }

        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_probes));
        let settings = ProbeSettings::from(&self.config);

        let mut probes = JoinSet::new();
        for target in targets {
            probes.spawn(check_target(
                target,
                self.registry.clone(),
                self.alerts.clone(),
                self.prober.clone(),
                limiter.clone(),
                settings.clone(),
            ));
        }

        while let Some(result) = probes.join_next().await {
            if let Err(e) = result {
                tracing::error!("Monitor cycle task crashed: {}", e);
            }
        }
    }

    /// The monitoring loop. Runs until the shutdown signal flips; nothing
    /// inside a cycle can terminate it.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Uptime monitoring loop started");
        let interval = Duration::from_secs(self.config.check_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!("Uptime monitoring loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Holds each probe in flight long enough to observe overlap.
    struct SlowProber {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl HttpProber for SlowProber {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<u16, ProbeError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(200)
        }
    }

    fn monitor_with(prober: Arc<dyn HttpProber>, config: MonitorConfig) -> Arc<Monitor> {
        let registry = Arc::new(Registry::new());
        for i in 0..5 {
            registry.register(&format!("svc-{i}"), &format!("https://svc-{i}.example.com"));
        }
        Arc::new(Monitor::new(
            registry,
            Arc::new(AlertEngine::new(None, 3)),
            prober,
            config,
        ))
    }

    #[tokio::test]
    async fn test_cycle_respects_concurrency_cap() {
        let prober = Arc::new(SlowProber {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let config = MonitorConfig {
            max_concurrent_probes: 2,
            ..Default::default()
        };

        let monitor = monitor_with(prober.clone(), config);
        monitor.run_cycle().await;

        assert!(prober.max_active.load(Ordering::SeqCst) <= 2);

        // Every target was still probed exactly once.
        for target in monitor.registry.list_all() {
            assert_eq!(target.total_checks, 1);
        }
    }

    #[tokio::test]
    async fn test_cycle_with_empty_registry_is_a_noop() {
        let monitor = Arc::new(Monitor::new(
            Arc::new(Registry::new()),
            Arc::new(AlertEngine::new(None, 3)),
            Arc::new(SlowProber {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }),
            MonitorConfig::default(),
        ));
        monitor.run_cycle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_signal() {
        let monitor = Arc::new(Monitor::new(
            Arc::new(Registry::new()),
            Arc::new(AlertEngine::new(None, 3)),
            Arc::new(SlowProber {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }),
            MonitorConfig::default(),
        ));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(rx));

        tokio::task::yield_now().await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(300), handle)
            .await
            .expect("loop did not stop after shutdown signal")
            .unwrap();
    }
}
