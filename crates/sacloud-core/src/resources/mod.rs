//! Resource and data source handlers
//!
//! Each handler translates a [`ResourceData`] attribute bag into API calls on
//! the [`Client`] carried by the [`ProviderContext`], and writes the result
//! back into the bag.
//!
//! | type name | handler |
//! |---|---|
//! | `sakuracloud_dns_record` | [`dns_record::DnsRecordResource`] |
//! | `sakuracloud_ssh_key` | [`ssh_key::SshKeyResource`] |
//! | `sakuracloud_ssh_key_gen` | [`ssh_key_gen::SshKeyGenResource`] |
//! | `sakuracloud_dns` (data source) | [`dns::DnsDataSource`] |
//! | `sakuracloud_vpc_router` (data source) | [`vpc_router::VpcRouterDataSource`] |

pub mod dns;
pub mod dns_record;
pub mod ssh_key;
pub mod ssh_key_gen;
pub mod vpc_router;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::mutex_kv::MutexKV;
use crate::schema::{ResourceData, Schema};
use crate::traits::Client;

/// Everything a handler needs besides its own attributes
#[derive(Clone)]
pub struct ProviderContext {
    /// API backend
    pub client: Client,
    /// Per-object locks for read-modify-write sequences
    pub locks: MutexKV,
}

impl ProviderContext {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            locks: MutexKV::new(),
        }
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("backend", &self.client.backend_name())
            .field("locks", &self.locks)
            .finish()
    }
}

/// Trait for managed resources
///
/// `create` sets the id and leaves the bag in its read state; `delete`
/// clears the id. Handlers never retry: errors are terminal for the
/// operation.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Attribute schema
    fn schema(&self) -> Schema;

    async fn create(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()>;

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()>;

    /// Update in place; resources whose attributes are all force-new keep
    /// this default
    async fn update(&self, _ctx: &ProviderContext, _d: &mut ResourceData) -> Result<()> {
        Err(Error::unsupported(
            "resource does not support in-place update; it must be replaced",
        ))
    }

    async fn delete(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()>;
}

/// Trait for read-only data sources
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn schema(&self) -> Schema;

    async fn read(&self, ctx: &ProviderContext, d: &mut ResourceData) -> Result<()>;
}
