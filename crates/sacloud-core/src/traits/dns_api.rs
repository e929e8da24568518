// # DNS API Trait
//
// SakuraCloud hosts a DNS zone as a single remote object whose settings
// carry the complete list of record sets. There is no per-record endpoint:
// adding or removing a record means reading the zone, editing the list in
// memory and writing the whole zone back.
//
// ## Implementations
//
// - HTTP: `sacloud-api-http` crate (`/commonserviceitem`)
// - In-memory: [`crate::backend::MemoryCloud`]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::FindCondition;

/// Record type that carries a priority in its RData
pub const RECORD_TYPE_MX: &str = "MX";

/// Record type that carries priority, weight and port in its RData
pub const RECORD_TYPE_SRV: &str = "SRV";

/// Record types accepted by the DNS service
pub const ALLOWED_DNS_TYPES: &[&str] = &["A", "AAAA", "CNAME", "NS", "MX", "TXT", "SRV"];

/// A single record set inside a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnsRecordSet {
    /// Record name relative to the zone (e.g. "www", "@")
    pub name: String,
    /// Record type (e.g. "A", "MX")
    pub record_type: String,
    /// Record data as sent on the wire (MX: "<priority> <target>")
    pub rdata: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl DnsRecordSet {
    /// Create a record from its raw wire fields
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        rdata: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            rdata: rdata.into(),
            ttl,
        }
    }

    /// Create an MX record; the priority is folded into the RData
    pub fn new_mx(name: impl Into<String>, value: &str, ttl: u32, priority: u16) -> Self {
        Self::new(name, RECORD_TYPE_MX, format!("{} {}", priority, value), ttl)
    }

    /// Create an SRV record; priority, weight and port are folded into the RData
    pub fn new_srv(
        name: impl Into<String>,
        target: &str,
        ttl: u32,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Self {
        Self::new(
            name,
            RECORD_TYPE_SRV,
            format!("{} {} {} {}", priority, weight, port, target),
            ttl,
        )
    }

    /// True when every field (name, type, RData, ttl) is equal
    pub fn is_same(&self, other: &DnsRecordSet) -> bool {
        self.name == other.name
            && self.rdata == other.rdata
            && self.ttl == other.ttl
            && self.record_type == other.record_type
    }
}

impl fmt::Display for DnsRecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {}",
            self.name, self.ttl, self.record_type, self.rdata
        )
    }
}

/// A DNS zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    /// Resource id
    pub id: String,
    /// Zone name (e.g. "example.com")
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub icon_id: Option<String>,
    /// Zone name as reported in the resource status
    #[serde(default)]
    pub zone: String,
    /// Authoritative name servers assigned to the zone
    #[serde(default)]
    pub name_servers: Vec<String>,
    /// Every record set of the zone
    #[serde(default)]
    pub records: Vec<DnsRecordSet>,
}

impl Dns {
    /// Create an empty zone
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            zone: name.clone(),
            name,
            ..Self::default()
        }
    }

    /// Append a record
    pub fn add_record(&mut self, record: DnsRecordSet) {
        self.records.push(record);
    }
}

/// Trait for DNS zone API implementations
///
/// # Thread Safety
///
/// Implementations must be safe to call concurrently. They do not
/// serialize read-modify-write sequences; callers hold the zone lock
/// ([`crate::MutexKV`]) across `read_dns` → `update_dns`.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Search zones
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Dns>)`: Matching zones (possibly empty)
    /// - `Err(Error)`: If the request failed
    async fn find_dns(&self, condition: &FindCondition) -> Result<Vec<Dns>, crate::Error>;

    /// Read a zone by id
    ///
    /// # Returns
    ///
    /// - `Ok(Dns)`: The zone, including every record set
    /// - `Err(Error::NotFound)`: If the zone doesn't exist
    async fn read_dns(&self, id: &str) -> Result<Dns, crate::Error>;

    /// Replace a zone's settings (record list, description, tags)
    ///
    /// # Returns
    ///
    /// - `Ok(Dns)`: The zone as stored after the update
    /// - `Err(Error)`: If the update failed
    async fn update_dns(&self, id: &str, dns: &Dns) -> Result<Dns, crate::Error>;
}
