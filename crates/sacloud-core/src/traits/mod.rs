//! API traits the resource handlers are written against
//!
//! - [`DnsApi`]: read, update and search DNS zones
//! - [`SshKeyApi`]: manage SSH public keys, including server-side generation
//! - [`VpcRouterApi`]: search VPC routers
//! - [`Backend`]: the union of the above, plus backend lifecycle hooks

pub mod backend;
pub mod dns_api;
pub mod ssh_key_api;
pub mod vpc_router_api;

pub use backend::{Backend, BackendFactory, Client};
pub use dns_api::{Dns, DnsApi, DnsRecordSet};
pub use ssh_key_api::{
    GeneratedSshKey, SshKey, SshKeyApi, SshKeyCreateRequest, SshKeyGenerateRequest,
    SshKeyUpdateRequest,
};
pub use vpc_router_api::{VpcRouter, VpcRouterApi, VpcRouterPlan};
