// # Generated SSH Key Resource
//
// `sakuracloud_ssh_key_gen` asks the service to generate a key pair. The
// private key only exists in the generate response, so `read` refreshes the
// public attributes and leaves `private_key` as it is in state.

use async_trait::async_trait;
use tracing::info;

use super::ssh_key::set_ssh_key_resource_data;
use super::{ProviderContext, ResourceHandler};
use crate::error::{Result, ResultExt};
use crate::schema::{AttrKind, Attribute, ResourceData, Schema};
use crate::traits::SshKeyGenerateRequest;

/// Resource type name
pub const TYPE_NAME: &str = "sakuracloud_ssh_key_gen";

/// `sakuracloud_ssh_key_gen`
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeyGenResource;

pub fn expand_ssh_key_generate_request(d: &ResourceData) -> SshKeyGenerateRequest {
    SshKeyGenerateRequest {
        name: d.get_string("name"),
        description: d.get_string("description"),
        pass_phrase: d.get_string("pass_phrase"),
    }
}

#[async_trait]
impl ResourceHandler for SshKeyGenResource {
    fn schema(&self) -> Schema {
        Schema::new()
            .with(
                "name",
                Attribute::required(AttrKind::String).force_new().between(1, 64),
            )
            .with(
                "description",
                Attribute::optional(AttrKind::String).force_new().between(0, 512),
            )
            .with(
                "pass_phrase",
                Attribute::optional(AttrKind::String)
                    .force_new()
                    .sensitive()
                    .between(8, 64),
            )
            .with("public_key", Attribute::computed(AttrKind::String))
            .with(
                "private_key",
                Attribute::computed(AttrKind::String).sensitive(),
            )
            .with("fingerprint", Attribute::computed(AttrKind::String))
    }

    async fn create(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let request = expand_ssh_key_generate_request(d);
        let generated = ctx
            .client
            .generate_ssh_key(&request)
            .await
            .context("generating SakuraCloud SSHKey is failed")?;

        info!(
            "Generated SSH key {} ({})",
            generated.key.id, generated.key.name
        );
        d.set_id(generated.key.id.as_str());
        set_ssh_key_resource_data(d, &generated.key);
        d.set("private_key", generated.private_key);
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

    async fn delete(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let id = d.require_id()?.to_string();
        ctx.client
            .delete_ssh_key(&id)
            .await
            .context("deleting SakuraCloud SSHKey is failed")?;

        info!("Deleted generated SSH key {}", id);
        d.set_id("");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_carries_pass_phrase() {
        let d = ResourceData::new()
            .with("name", "ci")
            .with("pass_phrase", "correct-horse");

        let request = expand_ssh_key_generate_request(&d);
        assert_eq!(request.name, "ci");
        assert_eq!(request.description, "");
        assert_eq!(request.pass_phrase, "correct-horse");
        assert!(!format!("{:?}", request).contains("correct-horse"));
    }

    #[test]
    fn private_key_is_sensitive() {
        let schema = SshKeyGenResource.schema();
        assert!(schema.attribute("private_key").is_some_and(|a| a.sensitive));
        assert!(schema.attribute("pass_phrase").is_some_and(|a| a.sensitive));
    }
}
