//! Cluster configuration.
//!
//! Clusters can be described in a file (TOML, JSON or YAML) holding several
//! named entries, or through environment variables for a single node:
//!
//! ```toml
//! [clusters.local]
//! protocol = "http"
//! domain = "localhost"
//! port = 8098
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{HttpTransport, DEFAULT_SEARCH_PATH};
use crate::cluster::Cluster;
use crate::error::ConfigError;

/// Connection settings of a single Riak cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub protocol: String,
    pub domain: String,
    pub port: u16,
    /// Path of the search endpoint, `{bucket}` is replaced by the bucket name.
    pub search_path: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            domain: "localhost".to_string(),
            port: 8098,
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ClusterConfig {
    /// Reads the configuration from `RIAK_PROTOCOL`, `RIAK_DOMAIN`,
    /// `RIAK_PORT` and `RIAK_SEARCH_PATH`. Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(protocol) = lookup("RIAK_PROTOCOL") {
            config.protocol = protocol;
        }
        if let Some(domain) = lookup("RIAK_DOMAIN") {
            config.domain = domain;
        }
        if let Some(port) = lookup("RIAK_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "RIAK_PORT".to_string(),
                value: port,
            })?;
        }
        if let Some(search_path) = lookup("RIAK_SEARCH_PATH") {
            config.search_path = search_path;
        }

        Ok(config)
    }

    /// Creates a cluster reached through an HTTP transport.
    pub fn build(&self) -> Result<Cluster, ConfigError> {
        let transport = HttpTransport::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.connect_timeout_secs),
        )?
        .with_search_path(self.search_path.clone());

        debug!(
            protocol = %self.protocol,
            domain = %self.domain,
            port = self.port,
            "Created Riak cluster"
        );

        Ok(Cluster::new(
            self.protocol.clone(),
            self.domain.clone(),
            self.port,
            Arc::new(transport),
        ))
    }
}

/// A configuration file declaring named clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClustersFile {
    #[serde(default)]
    pub clusters: HashMap<String, ClusterConfig>,
}

impl ClustersFile {
    /// Parses a TOML, JSON or YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        parse_file(path)
    }

    /// Returns the cluster with the given name.
    pub fn cluster(&self, name: &str) -> Result<&ClusterConfig, ConfigError> {
        self.clusters
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCluster(name.to_string()))
    }
}

/// Parses a TOML, JSON or YAML file into the specified type.
///
/// # Arguments
/// * `path` - Path to the file to parse
///
/// # Returns
/// * `Ok(T)` - Successfully parsed file contents
/// * `Err` - File reading or parsing error
pub fn parse_file<P, T>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    if let Ok(content) = toml::from_str(&content) {
        Ok(content)
    } else if let Ok(content) = serde_json::from_str(&content) {
        Ok(content)
    } else if let Ok(content) = serde_yaml::from_str(&content) {
        Ok(content)
    } else {
        Err(ConfigError::Parse(path.display().to_string()))
    }
}
