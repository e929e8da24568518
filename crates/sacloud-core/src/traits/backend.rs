// # Backend Trait
//
// A backend is one complete implementation of the SakuraCloud API surface
// used by the provider. Resource handlers receive it as a [`Client`].
//
// ## Rules for implementations
//
// - One API round trip per trait call; no retry or backoff
// - No locking across calls (the provider owns the zone locks)
// - Credentials never appear in logs or `Debug` output

use async_trait::async_trait;
use std::sync::Arc;

use super::{DnsApi, SshKeyApi, VpcRouterApi};
use crate::config::ProviderConfig;

/// Shared handle to a backend
pub type Client = Arc<dyn Backend>;

/// Complete API surface plus lifecycle hooks
#[async_trait]
pub trait Backend: DnsApi + SshKeyApi + VpcRouterApi {
    /// Backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;

    /// Persist any pending changes
    ///
    /// Remote backends have nothing to flush. The in-memory backend writes
    /// its fixture file here.
    async fn flush(&self) -> Result<(), crate::Error> {
        Ok(())
    }
}

/// Helper trait for constructing backends from configuration
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Create a backend from configuration
    async fn create(&self, config: &ProviderConfig) -> Result<Client, crate::Error>;
}
