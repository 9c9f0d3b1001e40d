//! HTTP prober backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;

use super::ProbeError;

/// Network client capability used by the probe executor.
#[async_trait]
pub trait HttpProber: Send + Sync {
    /// Issue a GET and return the HTTP status code, whatever it is.
    ///
    /// Errors only for transport-level failures; a completed response with
    /// a 4xx/5xx code is still `Ok`.
    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError>;
}

/// Production prober using a shared reqwest client.
///
/// Redirects are followed (reqwest default). The per-attempt timeout is
/// set on each request so one client can serve attempts with different
/// deadlines.
pub struct ReqwestProber {
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new() -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProber for ReqwestProber {
    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(timeout)
                } else if e.is_connect() {
                    ProbeError::Connect(e.to_string())
                } else {
                    ProbeError::Network(e.to_string())
                }
            })?;

        Ok(response.status().as_u16())
    }
}
