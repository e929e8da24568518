//! Contract Test: Data sources and SSH keys
//!
//! Constraints verified:
//! - Data sources take the first match of their filter
//! - An empty result is an error, never an empty state
//! - Zone records are flattened with MX/SRV fields split out
//! - Generated private keys survive a refresh from the API

mod common;

use common::*;
use sacloud_core::traits::{Dns, DnsRecordSet, VpcRouter, VpcRouterPlan};
use sacloud_core::{Error, Operation, OperationRequest, ResourceData};
use serde_json::{Map, Value, json};
use tokio_test::{assert_err, assert_ok};

fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

async fn read_data_source(
    provider: &sacloud_core::Provider,
    type_name: &str,
    attributes: Value,
) -> sacloud_core::Result<ResourceData> {
    let response = provider
        .apply(OperationRequest::new(Operation::ReadDataSource, type_name).with_attributes(attrs(attributes)))
        .await?;
    Ok(response.into_state().unwrap_or_default())
}

#[tokio::test]
async fn dns_data_source_reads_zone_and_records() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    let mut zone = Dns::new("example.net");
    zone.description = "description_test".into();
    zone.tags = vec!["tag1".into(), "tag2".into()];
    zone.add_record(DnsRecordSet::new("www", "A", "192.0.2.1", 300));
    zone.add_record(DnsRecordSet::new_mx("@", "mx.example.net.", 3600, 20));
    zone.add_record(DnsRecordSet::new_srv("_sip._tcp", "sip.example.net.", 300, 1, 5, 5060));
    let zone = cloud.inner().insert_dns(zone).await;

    let d = assert_ok!(
        read_data_source(
            &provider,
            "sakuracloud_dns",
            json!({"filter": {"names": ["example.net"], "tags": ["tag1"]}}),
        )
        .await
    );

    assert_eq!(d.id(), Some(zone.id.as_str()));
    assert_eq!(d.get_string("zone"), "example.net");
    assert_eq!(d.get_string("description"), "description_test");
    assert_eq!(d.get_string_list("dns_servers").len(), 2);

    let records = d.get("record").and_then(Value::as_array).cloned().unwrap_or_default();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["priority"], json!(20));
    assert_eq!(records[1]["value"], json!("mx.example.net."));
    assert_eq!(records[2]["port"], json!(5060));
}

#[tokio::test]
async fn dns_data_source_without_match_is_an_error() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    let err = assert_err!(
        read_data_source(
            &provider,
            "sakuracloud_dns",
            json!({"filter": {"names": ["does-not-exist.example"]}}),
        )
        .await
    );

    assert!(matches!(err, Error::NoResults));
    assert_eq!(
        err.to_string(),
        "Your query returned no results. Please change your filters and try again."
    );
}

#[tokio::test]
async fn vpc_router_data_source_filters_by_tags() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    cloud
        .inner()
        .insert_vpc_router(VpcRouter {
            name: "router-other".into(),
            tags: vec!["tag1".into()],
            ..Default::default()
        })
        .await;
    let router = cloud
        .inner()
        .insert_vpc_router(VpcRouter {
            name: "router01".into(),
            description: "description_test".into(),
            tags: vec!["tag1".into(), "tag2".into(), "tag3".into()],
            plan: VpcRouterPlan::Premium,
            version: 2,
            zone: "is1b".into(),
            public_ip: Some("203.0.113.10".into()),
            ..Default::default()
        })
        .await;

    let d = assert_ok!(
        read_data_source(
            &provider,
            "sakuracloud_vpc_router",
            json!({"filter": {"tags": ["tag1", "tag3"]}}),
        )
        .await
    );

    assert_eq!(d.id(), Some(router.id.as_str()));
    assert_eq!(d.get_string("name"), "router01");
    assert_eq!(d.get_string("plan"), "premium");
    assert_eq!(d.get_string("public_ip"), "203.0.113.10");

    let err = assert_err!(
        read_data_source(
            &provider,
            "sakuracloud_vpc_router",
            json!({"filter": {"names": ["xxxxxxxxxxx"]}}),
        )
        .await
    );
    assert!(matches!(err, Error::NoResults));
}

#[tokio::test]
async fn ssh_key_update_keeps_public_key() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    let created = provider
        .apply(
            OperationRequest::new(Operation::Create, "sakuracloud_ssh_key").with_attributes(attrs(json!({
                "name": "deploy",
                "public_key": "ssh-ed25519 AAAA deploy@example"
            }))),
        )
        .await
        .unwrap()
        .into_state()
        .unwrap();
    let id = created.id().unwrap().to_string();
    assert!(!created.get_string("fingerprint").is_empty());

    let mut planned = created.attributes().clone();
    planned.insert("name".into(), json!("deploy-renamed"));
    planned.insert("description".into(), json!("rotated"));
    let updated = assert_ok!(
        provider
            .apply(
                OperationRequest::new(Operation::Update, "sakuracloud_ssh_key")
                    .with_id(id.as_str())
                    .with_attributes(planned)
                    .with_prior(created.attributes().clone()),
            )
            .await
    )
    .into_state()
    .unwrap();

    assert_eq!(updated.get_string("name"), "deploy-renamed");
    assert_eq!(updated.get_string("public_key"), "ssh-ed25519 AAAA deploy@example");

    let deleted = provider
        .apply(
            OperationRequest::new(Operation::Delete, "sakuracloud_ssh_key")
                .with_id(id.as_str())
                .with_attributes(updated.attributes().clone()),
        )
        .await
        .unwrap()
        .into_state()
        .unwrap();
    assert!(deleted.id().is_none());
    assert_eq!(cloud.inner().ssh_key_count().await, 0);
}

#[tokio::test]
async fn generated_private_key_survives_refresh() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    let created = provider
        .apply(
            OperationRequest::new(Operation::Create, "sakuracloud_ssh_key_gen")
                .with_attributes(attrs(json!({"name": "ci", "pass_phrase": "correct-horse"}))),
        )
        .await
        .unwrap()
        .into_state()
        .unwrap();
    let private_key = created.get_string("private_key");
    assert!(private_key.contains("PRIVATE KEY"));

    let refreshed = provider
        .apply(
            OperationRequest::new(Operation::Read, "sakuracloud_ssh_key_gen")
                .with_id(created.id().unwrap())
                .with_attributes(created.attributes().clone()),
        )
        .await
        .unwrap()
        .into_state()
        .unwrap();

    assert_eq!(refreshed.get_string("private_key"), private_key);
    assert_eq!(refreshed.get_string("public_key"), created.get_string("public_key"));
}

#[tokio::test]
async fn short_pass_phrase_is_rejected() {
    let cloud = RecordingCloud::new();
    let (provider, _) = provider_with_zone(&cloud).await;

    let err = assert_err!(
        provider
            .apply(
                OperationRequest::new(Operation::Create, "sakuracloud_ssh_key_gen")
                    .with_attributes(attrs(json!({"name": "ci", "pass_phrase": "short"}))),
            )
            .await
    );
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(cloud.inner().ssh_key_count().await, 0);
}
