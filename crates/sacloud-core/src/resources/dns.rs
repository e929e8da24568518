// # DNS Data Source
//
// `sakuracloud_dns` looks a zone up by filter and exposes its settings and
// record list. The first match wins; no match is an error.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::dns_record::split_rdata;
use super::{DataSourceHandler, ProviderContext};
use crate::error::{Error, Result, ResultExt};
use crate::filter::{FILTER_ATTR_NAME, FindCondition, expand_search_filter};
use crate::schema::{AttrKind, Attribute, ResourceData, Schema};
use crate::traits::{Dns, DnsRecordSet};

/// Data source type name
pub const TYPE_NAME: &str = "sakuracloud_dns";

/// `sakuracloud_dns`
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsDataSource;

/// Flatten one record set into the `record` list entry shape
pub fn flatten_dns_record(record: &DnsRecordSet) -> Result<Value> {
    let values = split_rdata(record)?;

    let mut r = Map::new();
    r.insert("name".into(), json!(record.name));
    r.insert("type".into(), json!(record.record_type));
    r.insert("value".into(), json!(values.value));
    r.insert("ttl".into(), json!(record.ttl));
    if let Some(priority) = values.priority {
        r.insert("priority".into(), json!(priority));
    }
    if let Some(weight) = values.weight {
        r.insert("weight".into(), json!(weight));
    }
    if let Some(port) = values.port {
        r.insert("port".into(), json!(port));
    }
    Ok(Value::Object(r))
}

/// Write a zone's computed attributes
pub fn set_dns_resource_data(d: &mut ResourceData, dns: &Dns) -> Result<()> {
    let records = dns
        .records
        .iter()
        .map(flatten_dns_record)
        .collect::<Result<Vec<_>>>()?;

    d.set_id(dns.id.as_str());
    d.set("zone", dns.zone.as_str());
    d.set("dns_servers", dns.name_servers.clone());
    d.set("icon_id", dns.icon_id.clone().unwrap_or_default());
    d.set("description", dns.description.as_str());
    d.set("tags", dns.tags.clone());
    d.set("record", records);
    Ok(())
}

#[async_trait]
impl DataSourceHandler for DnsDataSource {
    fn schema(&self) -> Schema {
        Schema::new()
            .with(FILTER_ATTR_NAME, Attribute::optional(AttrKind::Block))
            .with("zone", Attribute::computed(AttrKind::String))
            .with("dns_servers", Attribute::computed(AttrKind::List))
            .with("icon_id", Attribute::computed(AttrKind::String))
            .with("description", Attribute::computed(AttrKind::String))
            .with("tags", Attribute::computed(AttrKind::List))
            .with("record", Attribute::computed(AttrKind::BlockList))
    }

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let condition = FindCondition::new(expand_search_filter(d)?);

        let found = ctx
            .client
            .find_dns(&condition)
            .await
            .context("could not find SakuraCloud DNS resource")?;
        debug!("DNS search returned {} zone(s)", found.len());

        let dns = found.first().ok_or(Error::NoResults)?;
        set_dns_resource_data(d, dns)
    }
}
