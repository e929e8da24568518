// # sacloud-core
//
// Core library of the SakuraCloud provisioning provider.
//
// ## Architecture Overview
//
// - **API traits** (`DnsApi`, `SshKeyApi`, `VpcRouterApi`, `Backend`): what
//   the handlers need from SakuraCloud
// - **Resources / data sources**: translate attribute bags into API calls
// - **MutexKV**: per-zone lock around DNS read-modify-write sequences
// - **ProviderRegistry**: plugin-based registry of backends and handlers
// - **Provider**: dispatches one host operation at a time
//
// ## Design Principles
//
// 1. **Library-First**: the binary only wires configuration and I/O
// 2. **Plugin-Based**: backends register factories; no hard-coded if-else
// 3. **No hidden retries**: every error is terminal for the operation
// 4. **Zone records are sub-resources**: their ids are derived, not stored

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod mutex_kv;
pub mod provider;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod traits;

// Re-export core types for convenience
pub use backend::MemoryCloud;
pub use config::{BackendKind, OperationTimeouts, ProviderConfig};
pub use error::{Error, Result, ResultExt};
pub use filter::{FindCondition, SearchFilter};
pub use mutex_kv::MutexKV;
pub use provider::{Operation, OperationRequest, OperationResponse, Provider};
pub use registry::ProviderRegistry;
pub use resources::{DataSourceHandler, ProviderContext, ResourceHandler};
pub use schema::{ResourceData, Schema};
pub use traits::{Backend, BackendFactory, Client, DnsApi, SshKeyApi, VpcRouterApi};
