use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::TransportError;

/// Request configuration keys describing the connection rather than the query.
pub const CONNECTION_KEYS: [&str; 4] = ["protocol", "domain", "port", "bucket"];

/// Path of the Solr-compatible search endpoint, `{bucket}` is substituted.
pub const DEFAULT_SEARCH_PATH: &str = "/solr/{bucket}/select";

/// The raw answer of a search endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// Sends search requests to Riak.
///
/// The configuration carries the connection keys (`protocol`, `domain`,
/// `port`, `bucket`) next to the query parameters. Implementations must
/// report connection-level failures as [`TransportError::Unavailable`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        config: &HashMap<String, String>,
    ) -> Result<TransportResponse, TransportError>;
}

// This is the default transport used to reach Riak over HTTP.
// It wraps a reqwest::Client and turns a request configuration into
// a GET against the search endpoint of the configured node.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    search_path: String,
}

impl HttpTransport {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(HttpTransport {
            client,
            search_path: DEFAULT_SEARCH_PATH.to_string(),
        })
    }

    /// Replace the search endpoint path. `{bucket}` is substituted per request.
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = search_path.into();
        self
    }

    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("User-Agent", HeaderValue::from_static("riak-search/0.1.0"));

        headers
    }

    /// Builds the endpoint URL from the connection keys of a configuration.
    ///
    /// The bucket name is pushed as a single percent-encoded path segment.
    pub fn url(&self, config: &HashMap<String, String>) -> Result<Url, TransportError> {
        let raw = format!(
            "{}://{}:{}",
            connection_value(config, "protocol"),
            connection_value(config, "domain"),
            connection_value(config, "port"),
        );
        let mut url =
            Url::parse(&raw).map_err(|e| TransportError::request(format!("{}: {}", raw, e)))?;

        let bucket = connection_value(config, "bucket");
        url.path_segments_mut()
            .map_err(|_| TransportError::request(format!("{}: cannot be a base URL", raw)))?
            .clear()
            .extend(
                self.search_path
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(|segment| segment.replace("{bucket}", bucket)),
            );

        Ok(url)
    }

    fn query_parameters(config: &HashMap<String, String>) -> Vec<(&str, &str)> {
        let mut parameters = config
            .iter()
            .filter(|(key, _)| !CONNECTION_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect::<Vec<_>>();

        // Stable ordering keeps request URLs comparable in logs
        parameters.sort();
        parameters
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        config: &HashMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(config)?;
        debug!(url = %url, "Calling Riak search endpoint");

        let response = self
            .client
            .get(url)
            .query(&Self::query_parameters(config))
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await.map_err(classify_error)?;

        Ok(TransportResponse { status, url, body })
    }
}

fn connection_value<'a>(config: &'a HashMap<String, String>, key: &str) -> &'a str {
    config.get(key).map(String::as_str).unwrap_or_default()
}

// Connection and timeout failures mean the node cannot be reached at all,
// whether they hit while sending or while reading the body. Anything else
// is a problem with this particular request.
fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        TransportError::unavailable(err.to_string())
    } else {
        TransportError::request(err.to_string())
    }
}
