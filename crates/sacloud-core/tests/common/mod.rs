//! Test doubles and common utilities for contract tests
//!
//! `RecordingCloud` wraps the in-memory cloud, counts zone reads and writes
//! and can stall between a zone read and the caller's next step, which
//! widens the window for lost updates when the zone lock is missing.

#![allow(dead_code)]

use async_trait::async_trait;
use sacloud_core::backend::MemoryCloud;
use sacloud_core::error::Result;
use sacloud_core::filter::FindCondition;
use sacloud_core::resources::ProviderContext;
use sacloud_core::traits::{
    Backend, Dns, DnsApi, GeneratedSshKey, SshKey, SshKeyApi, SshKeyCreateRequest,
    SshKeyGenerateRequest, SshKeyUpdateRequest, VpcRouter, VpcRouterApi,
};
use sacloud_core::{OperationTimeouts, Provider, ProviderRegistry, ResourceData};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory cloud that records zone traffic
#[derive(Clone)]
pub struct RecordingCloud {
    inner: MemoryCloud,
    read_dns_count: Arc<AtomicUsize>,
    update_dns_count: Arc<AtomicUsize>,
    read_delay: Option<Duration>,
}

impl RecordingCloud {
    pub fn new() -> Self {
        Self {
            inner: MemoryCloud::new(),
            read_dns_count: Arc::new(AtomicUsize::new(0)),
            update_dns_count: Arc::new(AtomicUsize::new(0)),
            read_delay: None,
        }
    }

    /// Sleep after every zone read before returning it
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn inner(&self) -> &MemoryCloud {
        &self.inner
    }

    pub fn read_dns_count(&self) -> usize {
        self.read_dns_count.load(Ordering::SeqCst)
    }

    pub fn update_dns_count(&self) -> usize {
        self.update_dns_count.load(Ordering::SeqCst)
    }

    /// Create a new RecordingCloud that shares state and counters with an
    /// existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        other.clone()
    }
}

#[async_trait]
impl DnsApi for RecordingCloud {
    async fn find_dns(&self, condition: &FindCondition) -> Result<Vec<Dns>> {
        self.inner.find_dns(condition).await
    }

    async fn read_dns(&self, id: &str) -> Result<Dns> {
        self.read_dns_count.fetch_add(1, Ordering::SeqCst);
        let dns = self.inner.read_dns(id).await?;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(dns)
    }

    async fn update_dns(&self, id: &str, dns: &Dns) -> Result<Dns> {
        self.update_dns_count.fetch_add(1, Ordering::SeqCst);
        self.inner.update_dns(id, dns).await
    }
}

#[async_trait]
impl SshKeyApi for RecordingCloud {
    async fn create_ssh_key(&self, request: &SshKeyCreateRequest) -> Result<SshKey> {
        self.inner.create_ssh_key(request).await
    }

    async fn read_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.inner.read_ssh_key(id).await
    }

    async fn update_ssh_key(&self, id: &str, request: &SshKeyUpdateRequest) -> Result<SshKey> {
        self.inner.update_ssh_key(id, request).await
    }

    async fn delete_ssh_key(&self, id: &str) -> Result<()> {
        self.inner.delete_ssh_key(id).await
    }

    async fn generate_ssh_key(&self, request: &SshKeyGenerateRequest) -> Result<GeneratedSshKey> {
        self.inner.generate_ssh_key(request).await
    }
}

#[async_trait]
impl VpcRouterApi for RecordingCloud {
    async fn find_vpc_routers(&self, condition: &FindCondition) -> Result<Vec<VpcRouter>> {
        self.inner.find_vpc_routers(condition).await
    }
}

#[async_trait]
impl Backend for RecordingCloud {
    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// Provider over `cloud` with the builtin handlers and a zone `example.com`
pub async fn provider_with_zone(cloud: &RecordingCloud) -> (Provider, String) {
    let zone = cloud.inner().insert_dns(Dns::new("example.com")).await;
    let provider = Provider::with_client(
        Arc::new(ProviderRegistry::with_builtins()),
        Arc::new(RecordingCloud::sharing_counters_with(cloud)),
        OperationTimeouts::default(),
    );
    (provider, zone.id)
}

/// Handler context over `cloud`, for calling handlers directly
pub fn context(cloud: &RecordingCloud) -> ProviderContext {
    ProviderContext::new(Arc::new(RecordingCloud::sharing_counters_with(cloud)))
}

/// Attribute map for a `sakuracloud_dns_record`
pub fn record_attrs(dns_id: &str, name: &str, record_type: &str, value: &str) -> Map<String, Value> {
    let attrs = json!({
        "dns_id": dns_id,
        "name": name,
        "type": record_type,
        "value": value,
    });
    attrs.as_object().cloned().unwrap_or_default()
}

/// Attribute bag for a `sakuracloud_dns_record`, defaults applied
pub fn record_data(dns_id: &str, name: &str, record_type: &str, value: &str) -> ResourceData {
    ResourceData::from_attributes(record_attrs(dns_id, name, record_type, value))
        .with("ttl", 3600)
}
