// # SakuraCloud HTTP Backend
//
// Implements the `Backend` traits of `sacloud-core` against the SakuraCloud
// REST API 1.1.
//
// ## Behavior
//
// - One HTTP request per trait call
// - No retry, backoff or caching: errors go straight back to the handler
// - HTTP status codes map to specific `Error` variants (401/403, 404, 409,
//   429, 5xx); the API's `error_msg` is kept in the message
// - Search filters are sent the way the API expects them: a raw JSON object
//   as the whole query string
//
// ## Security Requirements
//
// - Access token and secret NEVER appear in logs or `Debug` output
// - Credentials come from `ProviderConfig` only
//
// ## API Reference
//
// Base URL: `{api_root_url}/{zone}/api/cloud/1.1`
//
// - Find DNS zones: GET `/commonserviceitem?{"Filter":{"Provider.Class":"dns",...}}`
// - Read/update a zone: GET|PUT `/commonserviceitem/:id`
// - SSH keys: POST `/sshkey`, GET|PUT|DELETE `/sshkey/:id`
// - Generate an SSH key: POST `/sshkey/generate`
// - Find VPC routers: GET `/appliance?{"Filter":{"Class":"vpcrouter",...}}`

use async_trait::async_trait;
use reqwest::Method;
use sacloud_core::config::ProviderConfig;
use sacloud_core::filter::FindCondition;
use sacloud_core::traits::{
    Backend, BackendFactory, Client, Dns, DnsApi, DnsRecordSet, GeneratedSshKey, SshKey,
    SshKeyApi, SshKeyCreateRequest, SshKeyGenerateRequest, SshKeyUpdateRequest, VpcRouter,
    VpcRouterApi, VpcRouterPlan,
};
use sacloud_core::{Error, ProviderRegistry, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// API path below `{api_root_url}/{zone}`
const API_PATH: &str = "api/cloud/1.1";

/// Value of `GenerateFormat` for server-side key generation
const SSH_KEY_GENERATE_FORMAT: &str = "openssh";

const USER_AGENT: &str = concat!("sacloud-provider-rs/", env!("CARGO_PKG_VERSION"));

/// SakuraCloud API client
///
/// # Security
///
/// The Debug implementation does NOT expose the credentials.
pub struct SacloudHttpClient {
    /// ⚠️ NEVER log this value
    access_token: String,
    /// ⚠️ NEVER log this value
    access_token_secret: String,
    /// `{api_root_url}/{zone}/api/cloud/1.1`
    base_url: String,
    zone: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SacloudHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SacloudHttpClient")
            .field("access_token", &"<REDACTED>")
            .field("access_token_secret", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("zone", &self.zone)
            .finish()
    }
}

impl SacloudHttpClient {
    /// Create a client from configuration
    ///
    /// Fails if the credentials are empty or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.access_token.is_empty() || config.access_token_secret.is_empty() {
            return Err(Error::config(
                "SakuraCloud access token and secret are required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = format!(
            "{}/{}/{}",
            config.api_root_url.trim_end_matches('/'),
            config.zone,
            API_PATH
        );

        Ok(Self {
            access_token: config.access_token.clone(),
            access_token_secret: config.access_token_secret.clone(),
            base_url,
            zone: config.zone.clone(),
            client,
        })
    }

    /// Point the client at another base URL (mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return the successful response
    ///
    /// `query` is appended verbatim (percent-encoded) as the query string.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
        body: Option<Value>,
    ) -> Result<reqwest::Response> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::config(format!("Invalid API URL: {}", e)))?;
        if let Some(ref query) = query {
            url.set_query(Some(query));
        }

        tracing::debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), url)
            .basic_auth(&self.access_token, Some(&self.access_token_secret));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::debug!("{} {} returned {}", method, path, status);
            return Err(map_status_error(status.as_u16(), path, &error_text));
        }

        Ok(response)
    }

    /// Send a request and decode the JSON response
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
        body: Option<Value>,
    ) -> Result<T> {
        let response = self.send(method, path, query, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::http(format!("Failed to parse response of {}: {}", path, e)))
    }
}

/// Map a non-success status to an error, keeping the API message
pub fn map_status_error(status: u16, path: &str, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error_msg)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => Error::auth(format!(
            "Invalid access token or insufficient permissions ({}): {}",
            status, message
        )),
        404 => Error::not_found(format!("{}: {}", path, message)),
        409 => Error::conflict(message),
        429 => Error::rate_limited(message),
        500..=599 => Error::api(status, format!("server error: {}", message)),
        _ => Error::api(status, message),
    }
}

/// Build the raw JSON query string for a find request
///
/// `class` is the fixed `(key, value)` pair selecting the resource class.
pub fn filter_query(condition: &FindCondition, class: (&str, &str)) -> String {
    let mut filter = Map::new();
    filter.insert(class.0.to_string(), json!(class.1));

    let search = &condition.filter;
    if let Some(ref id) = search.id {
        filter.insert("ID".into(), json!(id));
    }
    if !search.names.is_empty() {
        filter.insert("Name".into(), json!(search.names.join(" ")));
    }
    if !search.tags.is_empty() {
        filter.insert("Tags.Name".into(), json!(search.tags));
    }

    json!({
        "From": 0,
        "Count": condition.count,
        "Filter": filter,
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_msg: Option<String>,
}

/// Accept ids as JSON strings or numbers
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Num(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Num(n) => n.to_string(),
    })
}

/// Treat `null` as the default value
fn de_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IconRef {
    #[serde(rename = "ID", deserialize_with = "de_id")]
    id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    r#type: String,
    #[serde(rename = "RData", default)]
    rdata: String,
    #[serde(rename = "TTL", default)]
    ttl: u32,
}

impl From<&DnsRecordSet> for WireRecord {
    fn from(r: &DnsRecordSet) -> Self {
        Self {
            name: r.name.clone(),
            r#type: r.record_type.clone(),
            rdata: r.rdata.clone(),
            ttl: r.ttl,
        }
    }
}

impl From<WireRecord> for DnsRecordSet {
    fn from(r: WireRecord) -> Self {
        DnsRecordSet::new(r.name, r.r#type, r.rdata, r.ttl)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireDnsSettings {
    #[serde(rename = "ResourceRecordSets", default, deserialize_with = "de_null_default")]
    resource_record_sets: Vec<WireRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireSettings {
    #[serde(rename = "DNS", default)]
    dns: WireDnsSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireDnsStatus {
    #[serde(rename = "Zone", default)]
    zone: String,
    #[serde(rename = "NS", default, deserialize_with = "de_null_default")]
    ns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonServiceItem {
    #[serde(rename = "ID", deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "de_null_default")]
    description: String,
    #[serde(default, deserialize_with = "de_null_default")]
    tags: Vec<String>,
    #[serde(default)]
    icon: Option<IconRef>,
    #[serde(default, deserialize_with = "de_null_default")]
    settings: WireSettings,
    #[serde(default, deserialize_with = "de_null_default")]
    status: WireDnsStatus,
}

impl From<CommonServiceItem> for Dns {
    fn from(item: CommonServiceItem) -> Self {
        let zone = if item.status.zone.is_empty() {
            item.name.clone()
        } else {
            item.status.zone
        };
        Dns {
            id: item.id,
            name: item.name,
            description: item.description,
            tags: item.tags,
            icon_id: item.icon.map(|i| i.id),
            zone,
            name_servers: item.status.ns,
            records: item
                .settings
                .dns
                .resource_record_sets
                .into_iter()
                .map(DnsRecordSet::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommonServiceItemResponse {
    #[serde(rename = "CommonServiceItem")]
    item: CommonServiceItem,
}

#[derive(Debug, Deserialize)]
struct CommonServiceItemList {
    #[serde(rename = "CommonServiceItems", default, deserialize_with = "de_null_default")]
    items: Vec<CommonServiceItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireSshKey {
    #[serde(rename = "ID", deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "de_null_default")]
    description: String,
    #[serde(default, deserialize_with = "de_null_default")]
    public_key: String,
    #[serde(default, deserialize_with = "de_null_default")]
    fingerprint: String,
    #[serde(default)]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    private_key: Option<String>,
}

impl From<WireSshKey> for SshKey {
    fn from(k: WireSshKey) -> Self {
        SshKey {
            id: k.id,
            name: k.name,
            description: k.description,
            public_key: k.public_key,
            fingerprint: k.fingerprint,
            created_at: k.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SshKeyResponse {
    #[serde(rename = "SSHKey")]
    key: WireSshKey,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PlanRef {
    #[serde(rename = "ID", default)]
    id: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ZoneRef {
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RouterRemark {
    #[serde(rename = "VPCRouterVersion", default)]
    vpc_router_version: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplianceRemark {
    #[serde(rename = "Router", default, deserialize_with = "de_null_default")]
    router: RouterRemark,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplianceInterface {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InternetConnection {
    #[serde(rename = "Enabled", default)]
    enabled: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RouterSettings {
    #[serde(rename = "InternetConnection", default, deserialize_with = "de_null_default")]
    internet_connection: InternetConnection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplianceSettings {
    #[serde(rename = "Router", default, deserialize_with = "de_null_default")]
    router: RouterSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Appliance {
    #[serde(rename = "ID", deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "de_null_default")]
    description: String,
    #[serde(default, deserialize_with = "de_null_default")]
    tags: Vec<String>,
    #[serde(default)]
    icon: Option<IconRef>,
    #[serde(default, deserialize_with = "de_null_default")]
    plan: PlanRef,
    #[serde(default, deserialize_with = "de_null_default")]
    remark: ApplianceRemark,
    #[serde(default, deserialize_with = "de_null_default")]
    zone: ZoneRef,
    #[serde(default, deserialize_with = "de_null_default")]
    interfaces: Vec<Option<ApplianceInterface>>,
    #[serde(default, deserialize_with = "de_null_default")]
    settings: ApplianceSettings,
}

/// The API sends `"True"`/`"False"` strings for flags
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

impl From<Appliance> for VpcRouter {
    fn from(a: Appliance) -> Self {
        let public_ip = a
            .interfaces
            .into_iter()
            .next()
            .flatten()
            .and_then(|i| i.ip_address)
            .filter(|ip| !ip.is_empty());

        VpcRouter {
            id: a.id,
            name: a.name,
            description: a.description,
            tags: a.tags,
            icon_id: a.icon.map(|i| i.id),
            plan: VpcRouterPlan::from_id(a.plan.id).unwrap_or_default(),
            version: a.remark.router.vpc_router_version.unwrap_or(1),
            zone: a.zone.name,
            public_ip,
            internet_connection: truthy(&a.settings.router.internet_connection.enabled),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApplianceList {
    #[serde(rename = "Appliances", default, deserialize_with = "de_null_default")]
    appliances: Vec<Appliance>,
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl DnsApi for SacloudHttpClient {
    async fn find_dns(&self, condition: &FindCondition) -> Result<Vec<Dns>> {
        let query = filter_query(condition, ("Provider.Class", "dns"));
        let list: CommonServiceItemList = self
            .request(Method::GET, "/commonserviceitem", Some(query), None)
            .await?;

        tracing::debug!("Found {} DNS zone(s)", list.items.len());
        Ok(list.items.into_iter().map(Dns::from).collect())
    }

    async fn read_dns(&self, id: &str) -> Result<Dns> {
        let response: CommonServiceItemResponse = self
            .request(Method::GET, &format!("/commonserviceitem/{}", id), None, None)
            .await?;
        Ok(response.item.into())
    }

    async fn update_dns(&self, id: &str, dns: &Dns) -> Result<Dns> {
        let settings = WireSettings {
            dns: WireDnsSettings {
                resource_record_sets: dns.records.iter().map(WireRecord::from).collect(),
            },
        };
        let mut item = json!({
            "Description": dns.description,
            "Tags": dns.tags,
            "Settings": settings,
        });
        if let Some(ref icon_id) = dns.icon_id {
            item["Icon"] = json!({ "ID": icon_id });
        }

        tracing::info!(
            "Updating DNS zone {} ({} record(s))",
            id,
            dns.records.len()
        );
        let response: CommonServiceItemResponse = self
            .request(
                Method::PUT,
                &format!("/commonserviceitem/{}", id),
                None,
                Some(json!({ "CommonServiceItem": item })),
            )
            .await?;
        Ok(response.item.into())
    }
}

#[async_trait]
impl SshKeyApi for SacloudHttpClient {
    async fn create_ssh_key(&self, request: &SshKeyCreateRequest) -> Result<SshKey> {
        let body = json!({
            "SSHKey": {
                "Name": request.name,
                "Description": request.description,
                "PublicKey": request.public_key,
            }
        });
        let response: SshKeyResponse = self
            .request(Method::POST, "/sshkey", None, Some(body))
            .await?;
        Ok(response.key.into())
    }

    async fn read_ssh_key(&self, id: &str) -> Result<SshKey> {
        let response: SshKeyResponse = self
            .request(Method::GET, &format!("/sshkey/{}", id), None, None)
            .await?;
        Ok(response.key.into())
    }

    async fn update_ssh_key(&self, id: &str, request: &SshKeyUpdateRequest) -> Result<SshKey> {
        let body = json!({
            "SSHKey": {
                "Name": request.name,
                "Description": request.description,
            }
        });
        let response: SshKeyResponse = self
            .request(Method::PUT, &format!("/sshkey/{}", id), None, Some(body))
            .await?;
        Ok(response.key.into())
    }

    async fn delete_ssh_key(&self, id: &str) -> Result<()> {
        self.send(Method::DELETE, &format!("/sshkey/{}", id), None, None)
            .await?;
        Ok(())
    }

    async fn generate_ssh_key(&self, request: &SshKeyGenerateRequest) -> Result<GeneratedSshKey> {
        let mut key = json!({
            "Name": request.name,
            "Description": request.description,
            "GenerateFormat": SSH_KEY_GENERATE_FORMAT,
        });
        if !request.pass_phrase.is_empty() {
            key["PassPhrase"] = json!(request.pass_phrase);
        }

        let response: SshKeyResponse = self
            .request(
                Method::POST,
                "/sshkey/generate",
                None,
                Some(json!({ "SSHKey": key })),
            )
            .await?;

        let mut wire = response.key;
        let private_key = wire.private_key.take().ok_or_else(|| {
            Error::api(200, "generate response did not contain a private key")
        })?;
        Ok(GeneratedSshKey {
            key: wire.into(),
            private_key,
        })
    }
}

#[async_trait]
impl VpcRouterApi for SacloudHttpClient {
    async fn find_vpc_routers(&self, condition: &FindCondition) -> Result<Vec<VpcRouter>> {
        let query = filter_query(condition, ("Class", "vpcrouter"));
        let list: ApplianceList = self
            .request(Method::GET, "/appliance", Some(query), None)
            .await?;

        tracing::debug!("Found {} VPC router(s)", list.appliances.len());
        Ok(list.appliances.into_iter().map(VpcRouter::from).collect())
    }
}

#[async_trait]
impl Backend for SacloudHttpClient {
    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP clients
pub struct HttpBackendFactory;

#[async_trait]
impl BackendFactory for HttpBackendFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Client> {
        Ok(Arc::new(SacloudHttpClient::new(config)?))
    }
}

/// Register the HTTP backend with a registry
///
/// # Example
///
/// ```rust
/// use sacloud_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::with_builtins();
/// sacloud_api_http::register(&registry);
/// assert!(registry.has_backend("http"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_backend("http", Box::new(HttpBackendFactory));
}
