//! Self-ping loop that keeps development deployments from idling out.
//!
//! Only started outside production deployments. Probes the service's own
//! public `/health` URL on a fixed period; every failure is ignored.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::config;
use crate::core::error::AppResult;

/// Timing of the keep-alive loop
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            initial_delay: config::keep_alive::initial_delay(),
            interval: config::keep_alive::interval(),
            timeout: config::keep_alive::probe_timeout(),
        }
    }
}

/// Periodic health probe against a fixed URL
#[derive(Debug, Clone)]
pub struct KeepAlive {
    url: String,
    schedule: Schedule,
    client: Client,
}

impl KeepAlive {
    pub fn new(url: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            url: url.into(),
            schedule,
            client: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues a single probe and returns its status.
    ///
    /// Non-2xx responses are reported as errors.
    pub async fn ping_once(&self) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.schedule.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.status())
    }

    /// Probes forever: initial delay, then one probe per interval.
    pub async fn run(self) {
        tokio::time::sleep(self.schedule.initial_delay).await;
        loop {
            // Probe failures are expected (cold start, DNS, platform restarts) and never stop the loop.
            match self.ping_once().await {
                Ok(status) => log::debug!("Keep-alive probe {} -> {}", self.url, status),
                Err(e) => log::debug!("Keep-alive probe {} failed: {}", self.url, e),
            }
            tokio::time::sleep(self.schedule.interval).await;
        }
    }

    /// Runs the loop as a detached task. It is abandoned at process exit.
    pub fn spawn(self) -> JoinHandle<()> {
        log::info!("Keep-alive enabled: probing {} every {:?}", self.url, self.schedule.interval);
        tokio::spawn(self.run())
    }
}

/// Probes `url` once with the default timeout.
pub async fn probe(url: &str) -> AppResult<StatusCode> {
    let status = KeepAlive::new(url, Schedule::default()).ping_once().await?;
    Ok(status)
}
