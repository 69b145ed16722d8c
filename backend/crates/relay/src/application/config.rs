//! Application Configuration
//!
//! Configuration for the relay application layer.

use platform::retry::RetryPolicy;
use std::time::Duration;

/// Relay application configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Retry policy around lease acquisition
    pub lease_retry: RetryPolicy,
    /// Confirmation polling for broadcast transactions
    pub confirm_retry: RetryPolicy,
    /// Confirmation polling for provisioning transactions
    pub provision_confirm_retry: RetryPolicy,
    /// Age after which an InUse lease is considered orphaned
    pub stale_lease_max_age: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            lease_retry: RetryPolicy::new(
                6,
                Duration::from_millis(250),
                Duration::from_secs(4),
            ),
            confirm_retry: RetryPolicy::fixed(30, Duration::from_secs(15)),
            provision_confirm_retry: RetryPolicy::fixed(30, Duration::from_secs(2)),
            stale_lease_max_age: Duration::from_secs(600),
        }
    }
}

impl RelayConfig {
    pub fn with_rpc_url(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    pub fn stale_lease_max_age_ms(&self) -> i64 {
        self.stale_lease_max_age.as_millis() as i64
    }
}
