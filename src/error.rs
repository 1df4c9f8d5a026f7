//! Error types.
//!
//! Only [`SearchError`] reaches callers of [`SearchClient::search`]. The
//! collaborator errors ([`TransportError`], [`SerializerError`]) are sorted
//! into a [`SearchFailure`] which decides whether the failure propagates or
//! degrades into an empty response.
//!
//! [`SearchClient::search`]: crate::search_api::search::SearchClient::search

use thiserror::Error;

/// Errors surfaced to search callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Riak could not be reached at the transport level.
    #[error("Riak is unavailable")]
    Unavailable,
}

/// Errors raised by a [`Transport`](crate::client::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure or transport timeout.
    #[error("{0}")]
    Unavailable(String),

    /// The request could not be built or its response could not be read.
    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Create an unavailability error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}

/// Errors raised while turning a response body into a search response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializerError {
    /// The writer type has no matching deserializer.
    #[error("Unsupported response format: {0}")]
    UnsupportedFormat(String),

    /// The body does not match the announced format.
    #[error("Malformed response body: {0}")]
    Malformed(String),
}

impl SerializerError {
    /// Create a malformed body error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

impl From<serde_json::Error> for SerializerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<quick_xml::Error> for SerializerError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors raised while loading cluster configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is neither TOML, JSON nor YAML.
    #[error("Failed to parse {0} as TOML, JSON or YAML")]
    Parse(String),

    /// The requested cluster is not declared.
    #[error("Cluster '{0}' is not configured")]
    UnknownCluster(String),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: String, value: String },

    /// The HTTP transport could not be created.
    #[error("Failed to create HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// How a failed search attempt is handled.
///
/// `Unavailable` is propagated to the caller as [`SearchError::Unavailable`].
/// `Degraded` is logged and replaced by an empty response, so callers cannot
/// tell it apart from a search that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SearchFailure {
    Unavailable(String),
    Degraded(String),
}

impl From<TransportError> for SearchFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unavailable(msg) => Self::Unavailable(msg),
            TransportError::Request(msg) => Self::Degraded(msg),
        }
    }
}

impl From<SerializerError> for SearchFailure {
    fn from(err: SerializerError) -> Self {
        Self::Degraded(err.to_string())
    }
}
