//! Configuration types for the provider
//!
//! The binary builds a [`ProviderConfig`] from `SAKURACLOUD_*` environment
//! variables; library users may deserialize it from any serde source.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Zones accepted by the SakuraCloud API
pub const ALLOWED_ZONES: &[&str] = &["is1a", "is1b", "tk1a", "tk1b", "tk1v"];

/// Default API endpoint root; the zone and API version are appended to it
pub const DEFAULT_API_ROOT_URL: &str = "https://secure.sakura.ad.jp/cloud/zone";

/// Provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which API backend to talk to
    #[serde(default)]
    pub backend: BackendKind,

    /// API access token
    #[serde(default)]
    pub access_token: String,

    /// API access token secret
    #[serde(default)]
    pub access_token_secret: String,

    /// Target zone (e.g. "is1b")
    #[serde(default = "default_zone")]
    pub zone: String,

    /// API root URL
    #[serde(default = "default_api_root_url")]
    pub api_root_url: String,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// JSON file the in-memory backend loads from and flushes to
    #[serde(default)]
    pub memory_fixture: Option<PathBuf>,

    /// Per-operation timeouts
    #[serde(default)]
    pub timeouts: OperationTimeouts,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("backend", &self.backend)
            .field("access_token", &"<REDACTED>")
            .field("access_token_secret", &"<REDACTED>")
            .field("zone", &self.zone)
            .field("api_root_url", &self.api_root_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("memory_fixture", &self.memory_fixture)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a configuration for the HTTP backend
    pub fn http(access_token: impl Into<String>, access_token_secret: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
            ..Self::default()
        }
    }

    /// Create a configuration for the in-memory backend
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    /// Set the zone
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Set the API root URL
    pub fn with_api_root_url(mut self, url: impl Into<String>) -> Self {
        self.api_root_url = url.into();
        self
    }

    /// HTTP request timeout as a [`Duration`]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !ALLOWED_ZONES.contains(&self.zone.as_str()) {
            return Err(crate::Error::config(format!(
                "Unknown zone '{}'. Supported zones: {}",
                self.zone,
                ALLOWED_ZONES.join(", ")
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }

        self.timeouts.validate()?;

        match self.backend {
            BackendKind::Http => {
                if self.access_token.is_empty() {
                    return Err(crate::Error::config("SakuraCloud access token cannot be empty"));
                }
                if self.access_token_secret.is_empty() {
                    return Err(crate::Error::config(
                        "SakuraCloud access token secret cannot be empty",
                    ));
                }
                if !self.api_root_url.starts_with("https://")
                    && !self.api_root_url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "API root URL must use HTTP or HTTPS scheme. Got: {}",
                        self.api_root_url
                    )));
                }
            }
            BackendKind::Memory => {}
        }

        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            access_token: String::new(),
            access_token_secret: String::new(),
            zone: default_zone(),
            api_root_url: default_api_root_url(),
            http_timeout_secs: default_http_timeout_secs(),
            memory_fixture: None,
            timeouts: OperationTimeouts::default(),
        }
    }
}

/// API backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SakuraCloud REST API
    #[default]
    Http,
    /// In-process fake, optionally persisted to a fixture file
    Memory,
}

impl BackendKind {
    /// Registry key of the backend factory
    pub fn type_name(&self) -> &'static str {
        match self {
            BackendKind::Http => "http",
            BackendKind::Memory => "memory",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "memory" => Ok(BackendKind::Memory),
            other => Err(crate::Error::config(format!(
                "Unknown backend '{}'. Supported backends: http, memory",
                other
            ))),
        }
    }
}

/// Per-operation timeouts (in seconds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationTimeouts {
    #[serde(default = "default_write_timeout_secs")]
    pub create_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_secs: u64,
    #[serde(default = "default_write_timeout_secs")]
    pub update_secs: u64,
    #[serde(default = "default_write_timeout_secs")]
    pub delete_secs: u64,
}

impl OperationTimeouts {
    /// Validate that no timeout is zero
    pub fn validate(&self) -> Result<(), crate::Error> {
        let all = [
            ("create", self.create_secs),
            ("read", self.read_secs),
            ("update", self.update_secs),
            ("delete", self.delete_secs),
        ];
        for (name, secs) in all {
            if secs == 0 {
                return Err(crate::Error::config(format!("{} timeout must be > 0", name)));
            }
        }
        Ok(())
    }
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            create_secs: default_write_timeout_secs(),
            read_secs: default_read_timeout_secs(),
            update_secs: default_write_timeout_secs(),
            delete_secs: default_write_timeout_secs(),
        }
    }
}

fn default_zone() -> String {
    "is1b".to_string()
}

fn default_api_root_url() -> String {
    DEFAULT_API_ROOT_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    300
}

fn default_read_timeout_secs() -> u64 {
    5 * 60
}

fn default_write_timeout_secs() -> u64 {
    20 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_requires_credentials() {
        let config = ProviderConfig::http("", "");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("access token"));

        let config = ProviderConfig::http("token", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn memory_config_needs_no_credentials() {
        assert!(ProviderConfig::memory().validate().is_ok());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let config = ProviderConfig::memory().with_zone("us-east-1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"access_token": "t", "access_token_secret": "s"}"#).unwrap();

        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.zone, "is1b");
        assert_eq!(config.api_root_url, DEFAULT_API_ROOT_URL);
        assert_eq!(config.timeouts.read_secs, 300);
        assert_eq!(config.timeouts.create_secs, 1200);
    }

    #[test]
    fn debug_hides_credentials() {
        let config = ProviderConfig::http("token-value-1234", "secret-value-5678");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("token-value-1234"));
        assert!(!debug_str.contains("secret-value-5678"));
        assert!(debug_str.contains("ProviderConfig"));
    }

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("Memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("http".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert!("ftp".parse::<BackendKind>().is_err());
    }
}
