//! Operation dispatcher
//!
//! The [`Provider`] receives one [`OperationRequest`] at a time from the host
//! orchestrator, finds the handler for the request's type name, validates the
//! attributes against the handler's schema and runs the handler under the
//! configured per-operation timeout.
//!
//! ## Flow
//!
//! ```text
//! OperationRequest ──► registry lookup ──► Schema::prepare ──► handler
//!                                                                  │
//!                          OperationResponse ◄── ResourceData ◄────┘
//! ```
//!
//! The provider does no diffing and keeps no state between requests apart
//! from the API client and the per-zone locks, which it shares across
//! concurrent calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{OperationTimeouts, ProviderConfig};
use crate::error::{Error, Result};
use crate::registry::ProviderRegistry;
use crate::resources::ProviderContext;
use crate::schema::{ResourceData, Schema};
use crate::traits::Client;

/// Operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    ReadDataSource,
    /// Return the schema of a resource or data source type
    Schema,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ReadDataSource => "read_data_source",
            Operation::Schema => "schema",
        };
        f.write_str(name)
    }
}

/// One request from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: Operation,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Attributes from prior state; only used by `update`
    #[serde(default)]
    pub prior: Option<Map<String, Value>>,
}

impl OperationRequest {
    pub fn new(operation: Operation, type_name: impl Into<String>) -> Self {
        Self {
            operation,
            type_name: type_name.into(),
            id: None,
            attributes: Map::new(),
            prior: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_prior(mut self, prior: Map<String, Value>) -> Self {
        self.prior = Some(prior);
        self
    }

    fn resource_data(&self) -> ResourceData {
        let d = ResourceData::from_attributes(self.attributes.clone());
        match &self.id {
            Some(id) => d.with_id(id.as_str()),
            None => d,
        }
    }
}

/// Result of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationResponse {
    /// Resulting id and attributes (id is absent after delete)
    State(ResourceData),
    Schema(Schema),
}

impl OperationResponse {
    /// Resulting state, if this is not a schema response
    pub fn into_state(self) -> Option<ResourceData> {
        match self {
            OperationResponse::State(d) => Some(d),
            OperationResponse::Schema(_) => None,
        }
    }
}

/// Dispatches operations to resource and data source handlers
pub struct Provider {
    registry: Arc<ProviderRegistry>,
    ctx: ProviderContext,
    timeouts: OperationTimeouts,
}

impl Provider {
    /// Create the API client from `config` and build a provider around it
    pub async fn new(registry: Arc<ProviderRegistry>, config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = registry.create_client(config).await?;
        info!(
            "Using {} backend in zone {}",
            client.backend_name(),
            config.zone
        );
        Ok(Self::with_client(registry, client, config.timeouts.clone()))
    }

    /// Build a provider around an existing client
    pub fn with_client(
        registry: Arc<ProviderRegistry>,
        client: Client,
        timeouts: OperationTimeouts,
    ) -> Self {
        Self {
            registry,
            ctx: ProviderContext::new(client),
            timeouts,
        }
    }

    /// Shared handler context (client and per-zone locks)
    pub fn context(&self) -> &ProviderContext {
        &self.ctx
    }

    /// Run one operation
    pub async fn apply(&self, request: OperationRequest) -> Result<OperationResponse> {
        let operation = request.operation;
        let type_name = request.type_name.as_str();
        debug!(
            "{} {} (id: {})",
            operation,
            type_name,
            request.id.as_deref().unwrap_or("-")
        );

        if operation == Operation::Schema {
            return self.schema(type_name).map(OperationResponse::Schema);
        }

        let mut d = request.resource_data();

        if operation == Operation::ReadDataSource {
            let handler = self.registry.data_source(type_name)?;
            handler.schema().prepare(&mut d)?;
            self.with_timeout(self.timeouts.read_secs, handler.read(&self.ctx, &mut d))
                .await?;
            return Ok(OperationResponse::State(d));
        }

        let handler = self.registry.resource(type_name)?;
        let schema = handler.schema();

        match operation {
            Operation::Create => {
                schema.prepare(&mut d)?;
                self.with_timeout(self.timeouts.create_secs, handler.create(&self.ctx, &mut d))
                    .await?;
            }
            Operation::Read => {
                schema.prepare(&mut d)?;
                self.with_timeout(self.timeouts.read_secs, handler.read(&self.ctx, &mut d))
                    .await?;
            }
            Operation::Update => {
                schema.prepare(&mut d)?;
                if let Some(prior) = &request.prior {
                    let prior = ResourceData::from_attributes(prior.clone());
                    let reasons = schema.replacement_reasons(&prior, &d);
                    if !reasons.is_empty() {
                        warn!("{} cannot be updated in place: {:?}", type_name, reasons);
                        return Err(Error::unsupported(format!(
                            "{} must be replaced; changed attributes: {}",
                            type_name,
                            reasons.join(", ")
                        )));
                    }
                }
                self.with_timeout(self.timeouts.update_secs, handler.update(&self.ctx, &mut d))
                    .await?;
            }
            Operation::Delete => {
                schema.prepare(&mut d)?;
                self.with_timeout(self.timeouts.delete_secs, handler.delete(&self.ctx, &mut d))
                    .await?;
            }
            Operation::ReadDataSource | Operation::Schema => {
                return Err(Error::unsupported(format!(
                    "{} is not a resource operation",
                    operation
                )));
            }
        }

        Ok(OperationResponse::State(d))
    }

    /// Schema of a resource type, falling back to data source types
    pub fn schema(&self, type_name: &str) -> Result<Schema> {
        if let Ok(handler) = self.registry.resource(type_name) {
            return Ok(handler.schema());
        }
        Ok(self.registry.data_source(type_name)?.schema())
    }

    /// Persist backend state (memory fixture); no-op for the HTTP backend
    pub async fn flush(&self) -> Result<()> {
        self.ctx.client.flush().await
    }

    async fn with_timeout<F>(&self, secs: u64, operation: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let limit = Duration::from_secs(secs);
        tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| Error::Timeout(limit))?
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("ctx", &self.ctx)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryCloud;
    use crate::traits::Dns;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn provider_with_zone() -> (Provider, String) {
        let cloud = MemoryCloud::new();
        let zone = cloud.insert_dns(Dns::new("example.com")).await;
        let provider = Provider::with_client(
            Arc::new(ProviderRegistry::with_builtins()),
            Arc::new(cloud),
            OperationTimeouts::default(),
        );
        (provider, zone.id)
    }

    #[test]
    fn test_request_deserializes() {
        let request: OperationRequest = serde_json::from_value(json!({
            "operation": "read_data_source",
            "type": "sakuracloud_dns",
            "attributes": {"filter": {"names": ["example.com"]}}
        }))
        .unwrap();

        assert_eq!(request.operation, Operation::ReadDataSource);
        assert_eq!(request.type_name, "sakuracloud_dns");
        assert!(request.id.is_none());
        assert!(request.prior.is_none());
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let (provider, dns_id) = provider_with_zone().await;

        let request = OperationRequest::new(Operation::Create, "sakuracloud_dns_record")
            .with_attributes(attrs(json!({
                "dns_id": dns_id,
                "name": "www",
                "type": "A",
                "value": "192.0.2.1"
            })));
        let d = provider.apply(request).await.unwrap().into_state().unwrap();

        assert!(d.id().is_some_and(|id| id.starts_with("dnsrecord-")));
        assert_eq!(d.get_int("ttl"), 3600);
    }

    #[tokio::test]
    async fn test_invalid_type_is_rejected_before_api_call() {
        let (provider, dns_id) = provider_with_zone().await;

        let request = OperationRequest::new(Operation::Create, "sakuracloud_dns_record")
            .with_attributes(attrs(json!({
                "dns_id": dns_id,
                "name": "www",
                "type": "PTR",
                "value": "host.example.com."
            })));
        let err = provider.apply(request).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        let zone = provider.context().client.read_dns(&dns_id).await.unwrap();
        assert!(zone.records.is_empty());
    }

    #[tokio::test]
    async fn test_update_with_force_new_change_is_refused() {
        let (provider, _) = provider_with_zone().await;

        let request = OperationRequest::new(Operation::Update, "sakuracloud_ssh_key")
            .with_id("113000000002")
            .with_attributes(attrs(json!({"name": "deploy", "public_key": "ssh-ed25519 BBBB"})))
            .with_prior(attrs(json!({"name": "deploy", "public_key": "ssh-ed25519 AAAA"})));

        let err = provider.apply(request).await.unwrap_err();
        assert!(err.to_string().contains("public_key"));
    }

    #[tokio::test]
    async fn test_schema_operation() {
        let (provider, _) = provider_with_zone().await;

        let response = provider
            .apply(OperationRequest::new(Operation::Schema, "sakuracloud_vpc_router"))
            .await
            .unwrap();
        match response {
            OperationResponse::Schema(schema) => assert!(schema.attribute("plan").is_some()),
            other => panic!("unexpected response: {:?}", other),
        }

        assert!(provider.schema("sakuracloud_server").is_err());
    }
}
