// # SSH Key Resource
//
// `sakuracloud_ssh_key` registers an existing public key. Name and
// description can be changed in place; a new public key means a new
// resource.

use async_trait::async_trait;
use tracing::info;

use super::{ProviderContext, ResourceHandler};
use crate::error::{Result, ResultExt};
use crate::schema::{AttrKind, Attribute, ResourceData, Schema};
use crate::traits::{SshKey, SshKeyCreateRequest, SshKeyUpdateRequest};

/// Resource type name
pub const TYPE_NAME: &str = "sakuracloud_ssh_key";

/// `sakuracloud_ssh_key`
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeyResource;

pub fn expand_ssh_key_create_request(d: &ResourceData) -> SshKeyCreateRequest {
    SshKeyCreateRequest {
        name: d.get_string("name"),
        description: d.get_string("description"),
        public_key: d.get_string("public_key"),
    }
}

pub fn expand_ssh_key_update_request(d: &ResourceData) -> SshKeyUpdateRequest {
    SshKeyUpdateRequest {
        name: d.get_string("name"),
        description: d.get_string("description"),
    }
}

/// Write the public attributes of a key
pub(crate) fn set_ssh_key_resource_data(d: &mut ResourceData, key: &SshKey) {
    d.set("name", key.name.as_str());
    d.set("description", key.description.as_str());
    d.set("public_key", key.public_key.as_str());
    d.set("fingerprint", key.fingerprint.as_str());
}

#[async_trait]
impl ResourceHandler for SshKeyResource {
    fn schema(&self) -> Schema {
        Schema::new()
            .with("name", Attribute::required(AttrKind::String).between(1, 64))
            .with(
                "public_key",
                Attribute::required(AttrKind::String).force_new(),
            )
            .with(
                "description",
                Attribute::optional(AttrKind::String).between(0, 512),
            )
            .with("fingerprint", Attribute::computed(AttrKind::String))
    }

    async fn create(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let request = expand_ssh_key_create_request(d);
        let key = ctx
            .client
            .create_ssh_key(&request)
            .await
            .context("creating SakuraCloud SSHKey is failed")?;

        info!("Created SSH key {} ({})", key.id, key.name);
        d.set_id(key.id.as_str());
        set_ssh_key_resource_data(d, &key);
        Ok(())
    }

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let id = d.require_id()?.to_string();
        let key = ctx
            .client
            .read_ssh_key(&id)
            .await
            .context("could not read SakuraCloud SSHKey")?;

        set_ssh_key_resource_data(d, &key);
        Ok(())
    }

    async fn update(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let id = d.require_id()?.to_string();
        let request = expand_ssh_key_update_request(d);
        let key = ctx
            .client
            .update_ssh_key(&id, &request)
            .await
            .context("updating SakuraCloud SSHKey is failed")?;

        info!("Updated SSH key {} ({})", key.id, key.name);
        set_ssh_key_resource_data(d, &key);
        Ok(())
    }

    async fn delete(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let id = d.require_id()?.to_string();
        ctx.client
            .delete_ssh_key(&id)
            .await
            .context("deleting SakuraCloud SSHKey is failed")?;

        info!("Deleted SSH key {}", id);
        d.set_id("");
        Ok(())
    }
}
