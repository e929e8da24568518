// # SSH Key API Trait
//
// Public keys registered with the account, either uploaded by the user or
// generated by the service (in which case the private key is returned once,
// in the generate response, and never again).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A registered SSH public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Result of a server-side key generation
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSshKey {
    pub key: SshKey,
    pub private_key: String,
}

// The private key must never reach the logs
impl std::fmt::Debug for GeneratedSshKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedSshKey")
            .field("key", &self.key)
            .field("private_key", &"<REDACTED>")
            .finish()
    }
}

/// Request for uploading an existing public key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyCreateRequest {
    pub name: String,
    pub description: String,
    pub public_key: String,
}

/// Request for renaming or re-describing a key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyUpdateRequest {
    pub name: String,
    pub description: String,
}

/// Request for generating a key pair on the server
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyGenerateRequest {
    pub name: String,
    pub description: String,
    /// Optional pass phrase protecting the returned private key
    pub pass_phrase: String,
}

impl std::fmt::Debug for SshKeyGenerateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeyGenerateRequest")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("pass_phrase", &"<REDACTED>")
            .finish()
    }
}

/// Trait for SSH key API implementations
#[async_trait]
pub trait SshKeyApi: Send + Sync {
    /// Register an existing public key
    async fn create_ssh_key(&self, request: &SshKeyCreateRequest)
    -> Result<SshKey, crate::Error>;

    /// Read a key by id
    ///
    /// - `Err(Error::NotFound)`: If the key doesn't exist
    async fn read_ssh_key(&self, id: &str) -> Result<SshKey, crate::Error>;

    /// Update name and description of a key
    async fn update_ssh_key(
        &self,
        id: &str,
        request: &SshKeyUpdateRequest,
    ) -> Result<SshKey, crate::Error>;

    /// Delete a key
    async fn delete_ssh_key(&self, id: &str) -> Result<(), crate::Error>;

    /// Generate a key pair on the server
    async fn generate_ssh_key(
        &self,
        request: &SshKeyGenerateRequest,
    ) -> Result<GeneratedSshKey, crate::Error>;
}
