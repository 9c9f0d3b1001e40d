//! Supervisor for the monitoring loop's lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use super::Monitor;

/// Owns the background monitoring loop: starts it, observes how it
/// terminates, and drives cooperative shutdown.
///
/// The loop is expected to run for the life of the process. Deliberate
/// cancellation is logged as a warning; anything else — a panic, or the
/// loop returning without a shutdown request — is a critical failure of
/// the monitoring subsystem.
pub struct Supervisor {
    watcher: JoinHandle<()>,
    abort: AbortHandle,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor {
    /// Spawn the monitoring loop and a watcher for its termination.
    pub fn start(monitor: Arc<Monitor>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let requested = shutdown_rx.clone();

        let loop_handle = tokio::spawn(monitor.run(shutdown_rx));
        let abort = loop_handle.abort_handle();

        let watcher = tokio::spawn(async move {
            match loop_handle.await {
                Ok(()) => {
                    if *requested.borrow() {
                        tracing::info!("Monitor loop task stopped");
                    } else {
                        tracing::error!("Monitor loop task exited unexpectedly");
                    }
                }
                Err(e) if e.is_cancelled() => {
                    tracing::warn!("Monitor loop task cancelled");
                }
                Err(e) => {
                    tracing::error!("Monitor loop task crashed unexpectedly: {}", e);
                }
            }
        });

        tracing::info!("Monitor loop task scheduled");

        Self {
            watcher,
            abort,
            shutdown_tx,
        }
    }

    /// Signal shutdown and wait up to `grace` for in-flight work to
    /// finish, aborting the loop when the grace period runs out.
    pub async fn shutdown(self, grace: Duration) {
        let _ = self.shutdown_tx.send(true);

        if tokio::time::timeout(grace, self.watcher).await.is_err() {
            tracing::warn!("Monitor loop did not stop within {:?}, aborting", grace);
            self.abort.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertEngine;
    use crate::config::MonitorConfig;
    use crate::probe::{HttpProber, ProbeError};
    use crate::registry::Registry;

    struct NoopProber;

    #[async_trait::async_trait]
    impl HttpProber for NoopProber {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<u16, ProbeError> {
            Ok(200)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervised_loop_shuts_down_within_grace() {
        let monitor = Arc::new(Monitor::new(
            Arc::new(Registry::new()),
            Arc::new(AlertEngine::new(None, 3)),
            Arc::new(NoopProber),
            MonitorConfig::default(),
        ));

        let supervisor = Supervisor::start(monitor);
        tokio::task::yield_now().await;

        // Completes without hitting the grace timeout.
        supervisor.shutdown(Duration::from_secs(30)).await;
    }
}
