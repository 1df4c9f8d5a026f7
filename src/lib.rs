//! A Rust client for Riak Search.
//!
//! This library sends search queries to the Solr-compatible endpoint of a
//! Riak cluster and parses the JSON or XML answers into a typed response.
//! Unreachable nodes are reported as errors, every other failure is logged
//! and degrades into an empty response.

/// HTTP transport used to reach Riak
pub mod client;

/// Cluster and bucket descriptors
pub mod cluster;

/// Cluster configuration from files and environment
pub mod config;

/// Error types
pub mod error;

/// Response and error logging
pub mod logging;

/// Response body deserialization
pub mod serializer;

/// Search API functionality
pub mod search_api {
    pub use search::SearchClient;

    /// Search query building
    pub mod query;
    /// Search responses
    pub mod response;
    /// Search execution
    pub mod search;
}

/// Commonly used types and functions
pub mod prelude {
    pub use super::client::{HttpTransport, Transport, TransportResponse};
    pub use super::cluster::{Bucket, Cluster};
    pub use super::config::{ClusterConfig, ClustersFile};
    pub use super::error::SearchError;
    pub use super::logging::{LogExtras, ResponseLogger, TracingLogger};
    pub use super::search_api::query::{Query, QueryInput};
    pub use super::search_api::response::Response;
    pub use super::search_api::SearchClient;
    pub use super::serializer::{Deserializer, SolrSerializer};
}

pub use config::ClusterConfig;

/// Command-line interface functionality
pub mod cli {
    /// Base CLI functionality
    pub mod base;
    /// Search command
    pub mod search;
}
