//! Reachability checks run before any download starts.
//!
//! A probe is a single GET with connection reuse disabled and a hard
//! timeout. Any transport error, timeout or non-success status counts as
//! unreachable; the cause is only logged.

use crate::config::ProbeConfig;
use reqwest::Client;
use reqwest::header::{CONNECTION, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

/// Answers whether a URL is reachable within a timeout.
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    config: ProbeConfig,
}

impl ConnectivityProbe {
    #[must_use]
    pub const fn new(config: ProbeConfig) -> Self {
        Self {
            config,
        }
    }

    /// General internet check against the locale-appropriate default URL.
    pub async fn check_internet(&self) -> bool {
        let url = self.config.url_for_system_locale().to_string();
        self.check(&url).await
    }

    /// Check a specific URL with the configured timeout.
    pub async fn check(&self, url: &str) -> bool {
        is_reachable(url, self.config.timeout()).await
    }

    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

/// `true` when a GET of `url` answers with a success status within `timeout`.
pub async fn is_reachable(url: &str, timeout: Duration) -> bool {
    debug!("Probing {} (timeout {:?})", url, timeout);

    let client = match Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build probe client: {}", e);
            return false;
        }
    };

    match client.get(url).header(CONNECTION, HeaderValue::from_static("close")).send().await {
        Ok(response) if response.status().is_success() => {
            debug!("Probe of {} succeeded with {}", url, response.status());
            true
        }
        Ok(response) => {
            debug!("Probe of {} answered {}", url, response.status());
            false
        }
        Err(e) => {
            debug!("Probe of {} failed: {}", url, e);
            false
        }
    }
}
