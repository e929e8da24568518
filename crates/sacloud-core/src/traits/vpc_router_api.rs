// # VPC Router API Trait
//
// VPC routers are appliances; the provider only reads them (data source).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::FindCondition;

/// VPC router plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VpcRouterPlan {
    #[default]
    Standard,
    Premium,
    HighSpec,
}

impl VpcRouterPlan {
    /// Plan for an API plan id
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(VpcRouterPlan::Standard),
            2 => Some(VpcRouterPlan::Premium),
            3 => Some(VpcRouterPlan::HighSpec),
            _ => None,
        }
    }

    /// Name used in resource attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            VpcRouterPlan::Standard => "standard",
            VpcRouterPlan::Premium => "premium",
            VpcRouterPlan::HighSpec => "highspec",
        }
    }
}

impl fmt::Display for VpcRouterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A VPC router appliance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcRouter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub icon_id: Option<String>,
    #[serde(default)]
    pub plan: VpcRouterPlan,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub zone: String,
    /// Address of the public interface, absent for the standard plan behind NAT
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub internet_connection: bool,
}

/// Trait for VPC router API implementations
#[async_trait]
pub trait VpcRouterApi: Send + Sync {
    /// Search VPC routers
    async fn find_vpc_routers(
        &self,
        condition: &FindCondition,
    ) -> Result<Vec<VpcRouter>, crate::Error>;
}
