// # VPC Router Data Source
//
// `sakuracloud_vpc_router` looks a VPC router up by filter.

use async_trait::async_trait;

use super::{DataSourceHandler, ProviderContext};
use crate::error::{Error, Result, ResultExt};
use crate::filter::{FILTER_ATTR_NAME, FindCondition, expand_search_filter};
use crate::schema::{AttrKind, Attribute, ResourceData, Schema};
use crate::traits::VpcRouter;

/// Data source type name
pub const TYPE_NAME: &str = "sakuracloud_vpc_router";

/// `sakuracloud_vpc_router`
#[derive(Debug, Clone, Copy, Default)]
pub struct VpcRouterDataSource;

pub fn set_vpc_router_resource_data(d: &mut ResourceData, router: &VpcRouter) {
    d.set_id(router.id.as_str());
    d.set("name", router.name.as_str());
    d.set("description", router.description.as_str());
    d.set("tags", router.tags.clone());
    d.set("icon_id", router.icon_id.clone().unwrap_or_default());
    d.set("plan", router.plan.as_str());
    d.set("version", router.version);
    d.set("zone", router.zone.as_str());
    d.set("public_ip", router.public_ip.clone().unwrap_or_default());
    d.set("internet_connection", router.internet_connection);
}

#[async_trait]
impl DataSourceHandler for VpcRouterDataSource {
    fn schema(&self) -> Schema {
        Schema::new()
            .with(FILTER_ATTR_NAME, Attribute::optional(AttrKind::Block))
            .with("name", Attribute::computed(AttrKind::String))
            .with("description", Attribute::computed(AttrKind::String))
            .with("tags", Attribute::computed(AttrKind::List))
            .with("icon_id", Attribute::computed(AttrKind::String))
            .with("plan", Attribute::computed(AttrKind::String))
            .with("version", Attribute::computed(AttrKind::Int))
            .with("zone", Attribute::computed(AttrKind::String))
            .with("public_ip", Attribute::computed(AttrKind::String))
            .with("internet_connection", Attribute::computed(AttrKind::Bool))
    }

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()> {
        let condition = FindCondition::new(expand_search_filter(d)?);

        let found = ctx
            .client
            .find_vpc_routers(&condition)
            .await
            .context("could not find SakuraCloud VPCRouter resource")?;

        let router = found.first().ok_or(Error::NoResults)?;
        set_vpc_router_resource_data(d, router);
        Ok(())
    }
}
