//! sitewatch - Uptime Monitoring Engine
//!
//! Continuously probes registered endpoints, tracks their health and
//! latency history, and raises deduplicated DOWN/RECOVERY alerts.

mod alert;
mod config;
mod normalize;
mod probe;
mod registry;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use alert::{AlertEngine, Notifier, WebhookNotifier};
use config::MonitorConfig;
use probe::{HttpProber, ReqwestProber};
use registry::Registry;
use scheduler::{Monitor, Supervisor};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("sitewatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = MonitorConfig::load();
    tracing::info!("Starting sitewatch...");

    let registry = Arc::new(Registry::new());

    let notifier: Option<Arc<dyn Notifier>> = cfg
        .alert_webhook
        .clone()
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn Notifier>);
    if notifier.is_none() {
        tracing::info!("Alerting disabled (no webhook configured)");
    }
    let alerts = Arc::new(AlertEngine::new(notifier, cfg.alert_failure_threshold));

    let prober = Arc::new(ReqwestProber::new()?) as Arc<dyn HttpProber>;

    // Add a sample target if none exist (the registry is volatile and
    // starts empty until a persistence backend is wired up)
    if registry.is_empty() {
        if let Some(url) = normalize::normalize_url("example.com") {
            tracing::info!("Adding sample target: Example");
            if !registry.register("Example", &url) {
                tracing::warn!("Sample target was already registered");
            }
        }
    }

    // Start the supervised monitoring loop
    let monitor = Arc::new(Monitor::new(registry.clone(), alerts, prober, cfg));
    let supervisor = Supervisor::start(monitor);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    supervisor.shutdown(Duration::from_secs(30)).await;

    Ok(())
}
