// # DNS Record Resource
//
// `sakuracloud_dns_record` manages one record set inside a zone. The API
// has no record endpoint and records have no remote id, so:
//
// - create/delete read the zone, edit its record list and write it back,
//   holding the zone lock for the whole sequence
// - the resource id is synthetic: `dnsrecord-<crc32>` over zone id, type,
//   RData, ttl and name
// - a record is identified by (name, type, RData, ttl); every attribute is
//   force-new
//
// ## RData encoding
//
// | type | RData | attributes |
// |---|---|---|
// | MX | `"<priority> <value>"` | `priority`, `value` |
// | SRV | `"<priority> <weight> <port> <value>"` | `priority`, `weight`, `port`, `value` |
// | other | `"<value>"` | `value` |

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ProviderContext, ResourceHandler};
use crate::error::{Error, Result, ResultExt};
use crate::schema::{AttrKind, Attribute, ResourceData, Schema, int_to};
use crate::traits::dns_api::{ALLOWED_DNS_TYPES, RECORD_TYPE_MX, RECORD_TYPE_SRV};
use crate::traits::DnsRecordSet;

/// Resource type name
pub const TYPE_NAME: &str = "sakuracloud_dns_record";

/// TTL used when the attribute is omitted
pub const DEFAULT_TTL: i64 = 3600;

/// MX priority used when the attribute is omitted
pub const DEFAULT_MX_PRIORITY: u16 = 10;

/// Prefix of synthetic record ids
pub const ID_PREFIX: &str = "dnsrecord-";

/// `sakuracloud_dns_record`
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsRecordResource;

/// Attribute values recovered from a record's RData
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordValues {
    pub value: String,
    pub priority: Option<u16>,
    pub weight: Option<u16>,
    pub port: Option<u16>,
}

/// Build the record set described by the attributes
pub fn expand_dns_record(d: &ResourceData) -> Result<DnsRecordSet> {
    let name = d.get_string("name");
    let record_type = d.get_string("type");
    let value = d.get_string("value");
    let ttl: u32 = int_to("ttl", d.get_int("ttl"))?;

    match record_type.as_str() {
        RECORD_TYPE_MX => {
            let priority = match d.get_ok_int("priority") {
                Some(p) => int_to("priority", p)?,
                None => DEFAULT_MX_PRIORITY,
            };
            Ok(DnsRecordSet::new_mx(name, &value, ttl, priority))
        }
        RECORD_TYPE_SRV => {
            let srv_field = |key: &str| -> Result<u16> {
                let v = d.get(key).and_then(|v| v.as_i64()).ok_or_else(|| {
                    Error::invalid_input(format!("{} is required for SRV records", key))
                })?;
                int_to(key, v)
            };
            Ok(DnsRecordSet::new_srv(
                name,
                &value,
                ttl,
                srv_field("priority")?,
                srv_field("weight")?,
                srv_field("port")?,
            ))
        }
        _ => Ok(DnsRecordSet::new(name, record_type, value, ttl)),
    }
}

/// Split a record's RData back into attribute values
pub fn split_rdata(record: &DnsRecordSet) -> Result<RecordValues> {
    let malformed = || {
        Error::invalid_input(format!(
            "malformed {} RData: '{}'",
            record.record_type, record.rdata
        ))
    };
    let number = |s: &str| s.parse::<u16>().map_err(|_| malformed());

    match record.record_type.as_str() {
        RECORD_TYPE_MX => {
            // ex. record.rdata = "10 example.com."
            let (priority, value) = record.rdata.split_once(' ').ok_or_else(malformed)?;
            Ok(RecordValues {
                value: value.to_string(),
                priority: Some(number(priority)?),
                weight: None,
                port: None,
            })
        }
        RECORD_TYPE_SRV => {
            let parts: Vec<&str> = record.rdata.splitn(4, ' ').collect();
            let [priority, weight, port, target] = parts[..] else {
                return Err(malformed());
            };
            Ok(RecordValues {
                value: target.to_string(),
                priority: Some(number(priority)?),
                weight: Some(number(weight)?),
                port: Some(number(port)?),
            })
        }
        _ => Ok(RecordValues {
            value: record.rdata.clone(),
            priority: None,
            weight: None,
            port: None,
        }),
    }
}

/// First record in `records` equal in all four fields to `r`
pub fn find_record_match<'a>(
    r: &DnsRecordSet,
    records: &'a [DnsRecordSet],
) -> Option<&'a DnsRecordSet> {
    records.iter().find(|record| is_same_dns_record(r, record))
}

/// Record identity: name, type, RData and ttl all equal
pub fn is_same_dns_record(r1: &DnsRecordSet, r2: &DnsRecordSet) -> bool {
    r1.is_same(r2)
}

/// Synthetic id of a record inside zone `dns_id`
pub fn dns_record_id_hash(dns_id: &str, r: &DnsRecordSet) -> String {
    let buf = format!(
        "{}-{}-{}-{}-{}-",
        dns_id, r.record_type, r.rdata, r.ttl, r.name
    );
    format!("{}{}", ID_PREFIX, crc32fast::hash(buf.as_bytes()))
}

#[async_trait]
impl ResourceHandler for DnsRecordResource {
    fn schema(&self) -> Schema {
        Schema::new()
            .with("dns_id", Attribute::required(AttrKind::String).force_new())
            .with("name", Attribute::required(AttrKind::String).force_new())
            .with(
                "type",
                Attribute::required(AttrKind::String)
                    .force_new()
                    .one_of(ALLOWED_DNS_TYPES),
            )
            .with("value", Attribute::required(AttrKind::String).force_new())
            .with(
                "ttl",
                Attribute::optional(AttrKind::Int)
                    .force_new()
                    .with_default(DEFAULT_TTL),
            )
            .with(
                "priority",
                Attribute::optional(AttrKind::Int).force_new().between(0, 65535),
            )
            .with(
                "weight",
                Attribute::optional(AttrKind::Int).force_new().between(0, 65535),
            )
            .with(
                "port",
                Attribute::optional(AttrKind::Int).force_new().between(1, 65535),
            )
    }

    async fn create(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let dns_id = d.get_string("dns_id");
        let record = expand_dns_record(d)?;

        let lock = ctx.locks.lock(&dns_id).await;

        let mut dns = ctx
            .client
            .read_dns(&dns_id)
            .await
            .context("Couldn't find SakuraCloud DNS resource")?;

        if find_record_match(&record, &dns.records).is_some() {
            return Err(Error::context(
                "Failed to create SakuraCloud DNS resource",
                Error::duplicate(record.to_string()),
            ));
        }

        info!("Adding DNS record to zone {}: {}", dns_id, record);
        dns.add_record(record.clone());
        ctx.client
            .update_dns(&dns_id, &dns)
            .await
            .context("Failed to create SakuraCloud DNSRecord resource")?;

        d.set_id(dns_record_id_hash(&dns_id, &record));
        drop(lock);

        self.read(ctx, d).await
    }

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let dns_id = d.get_string("dns_id");

        let dns = ctx
            .client
            .read_dns(&dns_id)
            .await
            .context("Couldn't find SakuraCloud DNS resource")?;

        let wanted = expand_dns_record(d)?;
        let record = find_record_match(&wanted, &dns.records).ok_or_else(|| {
            Error::context(
                "Couldn't find SakuraCloud DNSRecord resource",
                Error::not_found(wanted.to_string()),
            )
        })?;
        debug!("Found DNS record in zone {}: {}", dns_id, record);

        let values = split_rdata(record)?;
        d.set("name", record.name.as_str());
        d.set("type", record.record_type.as_str());
        d.set("value", values.value);
        d.set("ttl", record.ttl);
        if let Some(priority) = values.priority {
            d.set("priority", priority);
        }
        if let Some(weight) = values.weight {
            d.set("weight", weight);
        }
        if let Some(port) = values.port {
            d.set("port", port);
        }

        Ok(())
    }

    async fn delete(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let dns_id = d.get_string("dns_id");
        let record = expand_dns_record(d)?;

        let _lock = ctx.locks.lock(&dns_id).await;

        let mut dns = ctx
            .client
            .read_dns(&dns_id)
            .await
            .context("Couldn't find SakuraCloud DNS resource")?;

        let before = dns.records.len();
        dns.records.retain(|r| !is_same_dns_record(r, &record));
        if dns.records.len() == before {
            return Err(Error::context(
                "Couldn't find SakuraCloud DNSRecord resource",
                Error::not_found(record.to_string()),
            ));
        }

        info!("Removing DNS record from zone {}: {}", dns_id, record);
        ctx.client
            .update_dns(&dns_id, &dns)
            .await
            .context("Failed to delete SakuraCloud DNSRecord resource")?;

        d.set_id("");
        Ok(())
    }
}
