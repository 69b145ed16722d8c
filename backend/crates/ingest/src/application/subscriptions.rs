//! Subscription Registry Use Case
//!
//! Maintains the provider's watch-list of on-chain addresses: it grows on
//! mint and shrinks on supply exhaustion. The provider only exposes
//! whole-list replacement, so every mutation is read-modify-replace
//! behind a single writer lock.
//!
//! The lock removes lost updates between in-process callers; a concurrent
//! writer in another process can still win the last replacement. That
//! window is imposed by the provider API, not by this design.

use crate::domain::repository::WatchlistApi;
use crate::error::IngestResult;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Subscription Registry
pub struct SubscriptionRegistry<W>
where
    W: WatchlistApi,
{
    api: Arc<W>,
    writer: Mutex<()>,
}

impl<W> SubscriptionRegistry<W>
where
    W: WatchlistApi,
{
    pub fn new(api: Arc<W>) -> Self {
        Self {
            api,
            writer: Mutex::new(()),
        }
    }

    /// Add an address to the watch-list.
    ///
    /// Returns false when the address was already present.
    pub async fn add(&self, address: &str) -> IngestResult<bool> {
        let _guard = self.writer.lock().await;
        let mut addresses = self.api.fetch_addresses().await?;
        if addresses.iter().any(|a| a == address) {
            return Ok(false);
        }
        addresses.push(address.to_string());
        self.api.replace_addresses(&addresses).await?;
        tracing::info!(address = %address, total = addresses.len(), "Watch-list address added");
        Ok(true)
    }

    /// Remove an address from the watch-list.
    ///
    /// Returns false when the address was not present. A removed address
    /// is never re-added without an explicit new provisioning step.
    pub async fn remove(&self, address: &str) -> IngestResult<bool> {
        let _guard = self.writer.lock().await;
        let mut addresses = self.api.fetch_addresses().await?;
        let before = addresses.len();
        addresses.retain(|a| a != address);
        if addresses.len() == before {
            return Ok(false);
        }
        self.api.replace_addresses(&addresses).await?;
        tracing::info!(address = %address, total = addresses.len(), "Watch-list address removed");
        Ok(true)
    }
}
