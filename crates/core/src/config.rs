use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::{BeaconError, BeaconResult};

/// Beacon configuration. Loaded from environment variables with the prefix
/// `SEARCH_BEACON__` and, for native embeddings, an optional TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconConfig {
    /// Collection endpoint that receives `POST`ed event bodies.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Durable storage key holding the device identity.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Use the page-unload-safe one-way sender when the runtime has one.
    #[serde(default = "default_prefer_one_way")]
    pub prefer_one_way: bool,
}

fn default_endpoint() -> String {
    "https://bassam-tracker.onrender.com/track".to_string()
}
fn default_storage_key() -> String {
    "deviceId".to_string()
}
fn default_prefer_one_way() -> bool {
    true
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            storage_key: default_storage_key(),
            prefer_one_way: default_prefer_one_way(),
        }
    }
}

impl BeaconConfig {
    /// Load configuration from the environment (e.g. `SEARCH_BEACON__ENDPOINT`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(env_source());
        builder.build()?.try_deserialize()
    }

    /// Load configuration from an optional TOML file, with environment
    /// variables taking precedence over file values.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(env_source());
        builder.build()?.try_deserialize()
    }

    /// Builder-style override of the collection endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Check that the endpoint is an absolute http(s) URL and the storage key
    /// is usable.
    pub fn validate(&self) -> BeaconResult<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| BeaconError::Config(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BeaconError::Config(format!(
                "endpoint scheme must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.storage_key.trim().is_empty() {
            return Err(BeaconError::Config("storage_key must not be empty".into()));
        }
        Ok(())
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("SEARCH_BEACON")
        .separator("__")
        .try_parsing(true)
}
