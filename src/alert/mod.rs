//! Alert engine: deduplicated DOWN and RECOVERY notifications.
//!
//! Level-triggered per-target latch, evaluated immediately after every
//! outcome write-back. A target that stays down for many cycles produces
//! exactly one DOWN notification until it actually recovers; the latch is
//! cleared only by a successful check.

mod notifier;

pub use notifier::*;

use std::sync::Arc;

use serde::Serialize;

use crate::registry::{OutcomeSummary, Registry, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Down,
    Recovery,
}

/// Rendered alert handed to the delivery layer.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub kind: AlertKind,
    pub service: String,
    pub url: String,
    pub consecutive_failures: u32,
    pub message: String,
}

impl AlertPayload {
    fn down(target: &Target, failures: u32) -> Self {
        Self {
            kind: AlertKind::Down,
            service: target.name.clone(),
            url: target.url.clone(),
            consecutive_failures: failures,
            message: format!(
                "🚨 Service DOWN\n\nService: `{}`\nFailures: `{}` consecutive checks",
                target.name, failures
            ),
        }
    }

    fn recovery(target: &Target) -> Self {
        Self {
            kind: AlertKind::Recovery,
            service: target.name.clone(),
            url: target.url.clone(),
            consecutive_failures: 0,
            message: format!(
                "✅ Service RECOVERED\n\nService: `{}` is back online.",
                target.name
            ),
        }
    }
}

/// Decides when to notify, based on the transition summary returned by
/// [`Registry::record_outcome`].
pub struct AlertEngine {
    notifier: Option<Arc<dyn Notifier>>,
    failure_threshold: u32,
}

impl AlertEngine {
    /// A `None` notifier disables alerting entirely; no latch is ever set
    /// in that case.
    pub fn new(notifier: Option<Arc<dyn Notifier>>, failure_threshold: u32) -> Self {
        Self {
            notifier,
            failure_threshold,
        }
    }

    /// Evaluate alert transitions right after a check write-back.
    ///
    /// DOWN fires once the failure count reaches the threshold while the
    /// latch is clear, then latches. RECOVERY fires when a success cleared
    /// a set latch — `record_outcome` reports that through `recovered`,
    /// since the latch itself is already clear by the time we run.
    pub async fn evaluate(&self, registry: &Registry, url: &str, summary: &OutcomeSummary) {
        let Some(notifier) = &self.notifier else {
            return; // alerting disabled
        };

        let Some(target) = registry.get_by_url(url) else {
            return;
        };

        if summary.recovered {
            notifier.send(&AlertPayload::recovery(&target)).await;
            tracing::info!("RECOVERY alert sent | {}", target.name);
            return;
        }

        if summary.consecutive_failures >= self.failure_threshold && !summary.alert_latched {
            notifier
                .send(&AlertPayload::down(&target, summary.consecutive_failures))
                .await;
            registry.latch_alert(url);
            tracing::warn!("DOWN alert sent | {}", target.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CheckOutcome;

    const URL: &str = "https://example.com";

    struct Fixture {
        registry: Registry,
        engine: AlertEngine,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(threshold: u32) -> Fixture {
        let registry = Registry::new();
        registry.register("Svc", URL);
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = AlertEngine::new(Some(notifier.clone() as Arc<dyn Notifier>), threshold);
        Fixture {
            registry,
            engine,
            notifier,
        }
    }

    async fn fail(f: &Fixture) {
        let summary = f.registry.record_outcome(URL, CheckOutcome::Down).unwrap();
        f.engine.evaluate(&f.registry, URL, &summary).await;
    }

    async fn succeed(f: &Fixture) {
        let summary = f
            .registry
            .record_outcome(
                URL,
                CheckOutcome::Up {
                    status: 200,
                    latency: Some(0.1),
                },
            )
            .unwrap();
        f.engine.evaluate(&f.registry, URL, &summary).await;
    }

    #[tokio::test]
    async fn test_down_fires_once_at_threshold() {
        let f = fixture(3);

        fail(&f).await;
        fail(&f).await;
        assert!(f.notifier.sent().is_empty());

        fail(&f).await;
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, AlertKind::Down);
        assert_eq!(sent[0].consecutive_failures, 3);

        // Further failures stay latched.
        fail(&f).await;
        fail(&f).await;
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_recovery_fires_once_and_rearms() {
        let f = fixture(3);

        for _ in 0..3 {
            fail(&f).await;
        }
        assert_eq!(f.notifier.sent().len(), 1);

        succeed(&f).await;
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].kind, AlertKind::Recovery);
        assert!(!f.registry.get_by_name("Svc").unwrap().alert_latched);

        // No duplicate recovery on further successes.
        succeed(&f).await;
        assert_eq!(f.notifier.sent().len(), 2);

        // A fresh outage alerts again.
        for _ in 0..3 {
            fail(&f).await;
        }
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].kind, AlertKind::Down);
    }

    #[tokio::test]
    async fn test_success_without_latch_is_silent() {
        let f = fixture(3);
        succeed(&f).await;
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_engine_never_latches() {
        let registry = Registry::new();
        registry.register("Svc", URL);
        let engine = AlertEngine::new(None, 1);

        for _ in 0..5 {
            let summary = registry.record_outcome(URL, CheckOutcome::Down).unwrap();
            engine.evaluate(&registry, URL, &summary).await;
        }

        assert!(!registry.get_by_name("Svc").unwrap().alert_latched);
    }

    #[tokio::test]
    async fn test_removed_target_is_ignored() {
        let f = fixture(1);
        let summary = f.registry.record_outcome(URL, CheckOutcome::Down).unwrap();
        f.registry.remove_by_name("Svc");
        f.engine.evaluate(&f.registry, URL, &summary).await;
        assert!(f.notifier.sent().is_empty());
    }
}
