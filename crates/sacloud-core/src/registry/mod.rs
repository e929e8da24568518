//! Plugin-based provider registry
//!
//! The registry maps backend names to factories and type names to resource
//! and data source handlers, so the operation dispatcher never hardcodes a
//! list of types.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sacloud_core::registry::ProviderRegistry;
//! use sacloud_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::with_builtins();
//! sacloud_api_http::register(&registry);
//!
//! let client = registry.create_client(&ProviderConfig::memory()).await?;
//! ```
//!
//! ## Registration
//!
//! Backend crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_backend("http", Box::new(HttpBackendFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backend::MemoryBackendFactory;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::resources::{
    DataSourceHandler, ResourceHandler, dns, dns_record, ssh_key, ssh_key_gen, vpc_router,
};
use crate::traits::{BackendFactory, Client};

/// Registry of backends, resources and data sources
///
/// ## Thread Safety
///
/// Interior mutability with `RwLock`: concurrent lookups, exclusive
/// registration.
#[derive(Default)]
pub struct ProviderRegistry {
    backends: RwLock<HashMap<String, Arc<dyn BackendFactory>>>,
    resources: RwLock<HashMap<String, Arc<dyn ResourceHandler>>>,
    data_sources: RwLock<HashMap<String, Arc<dyn DataSourceHandler>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the memory backend and every handler of this crate
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_backend("memory", Box::new(MemoryBackendFactory));

        registry.register_resource(dns_record::TYPE_NAME, Arc::new(dns_record::DnsRecordResource));
        registry.register_resource(ssh_key::TYPE_NAME, Arc::new(ssh_key::SshKeyResource));
        registry.register_resource(ssh_key_gen::TYPE_NAME, Arc::new(ssh_key_gen::SshKeyGenResource));

        registry.register_data_source(dns::TYPE_NAME, Arc::new(dns::DnsDataSource));
        registry.register_data_source(vpc_router::TYPE_NAME, Arc::new(vpc_router::VpcRouterDataSource));
        registry
    }

    /// Register a backend factory under its `SAKURACLOUD_BACKEND` name
    pub fn register_backend(&self, name: impl Into<String>, factory: Box<dyn BackendFactory>) {
        let mut backends = self.backends.write().unwrap_or_else(PoisonError::into_inner);
        backends.insert(name.into(), Arc::from(factory));
    }

    /// Register a managed resource handler
    pub fn register_resource(&self, type_name: impl Into<String>, handler: Arc<dyn ResourceHandler>) {
        let mut resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        resources.insert(type_name.into(), handler);
    }

    /// Register a data source handler
    pub fn register_data_source(
        &self,
        type_name: impl Into<String>,
        handler: Arc<dyn DataSourceHandler>,
    ) {
        let mut sources = self.data_sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(type_name.into(), handler);
    }

    /// Create the API client selected by `config.backend`
    ///
    /// # Returns
    ///
    /// - `Ok(Client)`: Shared client
    /// - `Err(Error::Config)`: If the backend is not registered (e.g. the
    ///   binary was built without the `http` feature)
    pub async fn create_client(&self, config: &ProviderConfig) -> Result<Client> {
        let backend_type = config.backend.type_name();

        let factory = {
            let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);
            backends
                .get(backend_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown backend type: {}", backend_type)))?
        };

        factory.create(config).await
    }

    /// Look up a resource handler
    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn ResourceHandler>> {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::unsupported(format!("Unknown resource type: {}", type_name)))
    }

    /// Look up a data source handler
    pub fn data_source(&self, type_name: &str) -> Result<Arc<dyn DataSourceHandler>> {
        let sources = self.data_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::unsupported(format!("Unknown data source type: {}", type_name)))
    }

    /// List all registered backend names
    pub fn list_backends(&self) -> Vec<String> {
        let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);
        backends.keys().cloned().collect()
    }

    /// List all registered resource type names
    pub fn list_resources(&self) -> Vec<String> {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        resources.keys().cloned().collect()
    }

    /// List all registered data source type names
    pub fn list_data_sources(&self) -> Vec<String> {
        let sources = self.data_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    pub fn has_backend(&self, name: &str) -> bool {
        let backends = self.backends.read().unwrap_or_else(PoisonError::into_inner);
        backends.contains_key(name)
    }

    pub fn has_resource(&self, type_name: &str) -> bool {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        resources.contains_key(type_name)
    }

    pub fn has_data_source(&self, type_name: &str) -> bool {
        let sources = self.data_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(type_name)
    }
}
