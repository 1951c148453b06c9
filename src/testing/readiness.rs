//! Readiness probing for dependency servers
//!
//! A server counts as ready as soon as it answers an HTTP `HEAD /` with any
//! status. Connection errors and timeouts mean "not yet".

use std::time::Duration;

use async_trait::async_trait;

use crate::common::config::ReadinessConfig;
use crate::common::{Error, Result};

/// A single liveness check against a port
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    async fn is_ready(&self, port: u16) -> bool;
}

/// HTTP `HEAD /` readiness check
pub struct HttpCheck {
    client: reqwest::Client,
    host: String,
}

impl HttpCheck {
    pub fn new(config: &ReadinessConfig) -> Result<Self> {
        // A proxy would answer on behalf of a dead server
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build readiness client: {}", e)))?;

        Ok(Self {
            client,
            host: config.host.clone(),
        })
    }
}

#[async_trait]
impl ReadinessCheck for HttpCheck {
    async fn is_ready(&self, port: u16) -> bool {
        let url = format!("http://{}:{}/", self.host, port);
        match self.client.head(&url).send().await {
            Ok(response) => {
                tracing::debug!(%url, status = %response.status(), "Server answered");
                true
            }
            Err(e) => {
                tracing::debug!(%url, "Not ready: {}", e);
                false
            }
        }
    }
}

/// Poll `check` until the server on `port` answers
///
/// Returns the number of attempts used, or [`Error::ReadinessTimeout`] after
/// `policy.max_attempts` failed attempts.
pub async fn wait_until_ready(
    check: &dyn ReadinessCheck,
    project: &str,
    port: u16,
    policy: &ReadinessConfig,
) -> Result<u32> {
    let interval = Duration::from_millis(policy.interval_ms);
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if check.is_ready(port).await {
            return Ok(attempt);
        }
        if attempt < max_attempts {
            tracing::debug!(project, port, attempt, "Server not up yet, retrying");
            tokio::time::sleep(interval).await;
        }
    }

    Err(Error::ReadinessTimeout {
        project: project.to_string(),
        port,
        attempts: max_attempts,
    })
}
