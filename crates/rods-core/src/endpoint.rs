//! Endpoint configuration
//!
//! Describes where the data-grid server lives and which identity to
//! authenticate as. The JSON form matches the client environment document,
//! so an existing environment file can be loaded as-is.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, RodsError};

/// Default port of the data-grid server
pub const DEFAULT_PORT: u16 = 1247;

/// Connection parameters for one remote zone
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Server host name or address
    #[serde(alias = "irods_host")]
    pub host: String,

    /// Server port
    #[serde(alias = "irods_port", default = "default_port")]
    pub port: u16,

    /// User to authenticate as
    #[serde(alias = "irods_user_name")]
    pub user_name: String,

    /// Password for `user_name`
    ///
    /// Never written back out when the configuration is serialized.
    #[serde(alias = "irods_password", default, skip_serializing)]
    pub password: Option<String>,

    /// Zone the user belongs to
    #[serde(alias = "irods_zone_name")]
    pub zone_name: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl EndpointConfig {
    /// Create an endpoint on the default port without a password
    pub fn new(
        host: impl Into<String>,
        user_name: impl Into<String>,
        zone_name: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user_name: user_name.into(),
            password: None,
            zone_name: zone_name.into(),
        }
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Parse an endpoint from a JSON environment document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let endpoint: Self = serde_json::from_str(json)?;
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Load an endpoint from a JSON environment file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading endpoint configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// `host:port` string for display and socket addressing
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the endpoint
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RodsError::Configuration("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(RodsError::Configuration("port must not be 0".to_string()));
        }
        if self.user_name.trim().is_empty() {
            return Err(RodsError::Configuration(
                "user name must not be empty".to_string(),
            ));
        }
        if self.zone_name.trim().is_empty() {
            return Err(RodsError::Configuration(
                "zone name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("zone_name", &self.zone_name)
            .finish()
    }
}
