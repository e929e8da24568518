// # Backend Implementations
//
// Backends that live in this crate. The HTTP backend lives in
// `sacloud-api-http` and registers itself with the registry.

pub mod memory;

pub use memory::{MemoryBackendFactory, MemoryCloud};
