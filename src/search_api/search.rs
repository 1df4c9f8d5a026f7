use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::cluster::{Bucket, Cluster};
use crate::error::{SearchError, SearchFailure};
use crate::logging::{LogExtras, ResponseLogger, TracingLogger};
use crate::search_api::query::{Query, QueryInput};
use crate::search_api::response::Response;
use crate::serializer::{Deserializer, SolrSerializer};

/// Per-call request configuration: query parameters plus connection keys.
pub type RequestConfig = HashMap<String, String>;

/// Issues search queries against Riak and parses the answers.
///
/// The client holds no per-call state, only the serializer and logger it was
/// built with, so a single instance can serve concurrent searches.
#[derive(Clone)]
pub struct SearchClient {
    serializer: Arc<dyn Deserializer>,
    logger: Arc<dyn ResponseLogger>,
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new(Arc::new(SolrSerializer), Arc::new(TracingLogger))
    }
}

impl SearchClient {
    pub fn new(serializer: Arc<dyn Deserializer>, logger: Arc<dyn ResponseLogger>) -> Self {
        SearchClient { serializer, logger }
    }

    /// Performs a search against a bucket of the given cluster.
    ///
    /// The query may be a bare string, which is searched with default
    /// parameters, or a fully built [`Query`].
    ///
    /// # Arguments
    ///
    /// * `cluster` - The cluster to send the request to.
    /// * `bucket` - The bucket to search.
    /// * `query` - The query string or query.
    ///
    /// # Returns
    ///
    /// The parsed response. Any failure other than Riak being unreachable is
    /// logged and yields an empty `Response`, indistinguishable from a search
    /// that matched nothing. Unreachable nodes yield `SearchError::Unavailable`.
    pub async fn search(
        &self,
        cluster: &Cluster,
        bucket: &Bucket,
        query: impl Into<QueryInput>,
    ) -> Result<Response, SearchError> {
        let query = query.into().into_query();

        match self.try_search(cluster, bucket, &query).await {
            Ok(response) => Ok(response.unwrap_or_default()),
            Err(SearchFailure::Unavailable(message)) => {
                self.logger.error(&format!("Riak is unavailable: {}", message));
                Err(SearchError::Unavailable)
            }
            Err(SearchFailure::Degraded(message)) => {
                self.logger.error(&format!(
                    "Unable to execute a search query. Full message is : \n{}",
                    message
                ));
                Ok(Response::default())
            }
        }
    }

    /// Assembles the request configuration of a search.
    ///
    /// Query parameters come first, the connection keys (`protocol`,
    /// `domain`, `port`, `bucket`) are inserted afterwards and win on
    /// collision. Values are not validated.
    pub fn config(&self, cluster: &Cluster, bucket: &Bucket, query: &Query) -> RequestConfig {
        let mut config = query.config();
        config.insert("protocol".to_string(), cluster.protocol().to_string());
        config.insert("domain".to_string(), cluster.domain().to_string());
        config.insert("port".to_string(), cluster.port().to_string());
        config.insert("bucket".to_string(), bucket.name().to_string());
        config
    }

    async fn try_search(
        &self,
        cluster: &Cluster,
        bucket: &Bucket,
        query: &Query,
    ) -> Result<Option<Response>, SearchFailure> {
        let config = self.config(cluster, bucket, query);
        let mut extras = LogExtras::new("GET");

        let response = cluster.transport().get(&config).await?;

        if response.status != 200 {
            self.logger.log_response(&response, &extras);
            return Ok(None);
        }

        let started = Instant::now();
        let search_response = self.serializer.deserialize(&response.body, query.wt())?;
        extras.deserialization_time = Some(started.elapsed().as_secs_f64());
        extras.search_time = search_response.as_ref().and_then(Response::search_time);

        self.logger.log_response(&response, &extras);

        Ok(search_response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use httpmock::prelude::*;
    use lazy_static::lazy_static;

    use super::*;
    use crate::client::{Transport, TransportResponse};
    use crate::error::{SerializerError, TransportError};
    use crate::search_api::response::{NamedList, NamedValue, SimpleValue};
    use crate::ClusterConfig;

    lazy_static! {
        static ref MOCK_SERVER: MockServer = MockServer::start();
    }

    const JSON_BODY: &str = include_str!("../../tests/fixtures/search.json");
    const XML_BODY: &str = include_str!("../../tests/fixtures/search.xml");

    /// Transport answering every request with a fixed outcome and
    /// remembering the configurations it was called with.
    struct StubTransport {
        outcome: Result<TransportResponse, TransportError>,
        calls: Mutex<Vec<RequestConfig>>,
    }

    impl StubTransport {
        fn responding(status: u16, body: &str) -> Arc<Self> {
            Arc::new(StubTransport {
                outcome: Ok(TransportResponse {
                    status,
                    url: "http://riak.test:8098/solr/artists/select".to_string(),
                    body: body.to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: TransportError) -> Arc<Self> {
            Arc::new(StubTransport {
                outcome: Err(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<RequestConfig> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, config: &RequestConfig) -> Result<TransportResponse, TransportError> {
            self.calls.lock().unwrap().push(config.clone());
            self.outcome.clone()
        }
    }

    /// Transport that must never be reached.
    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn get(&self, _config: &RequestConfig) -> Result<TransportResponse, TransportError> {
            panic!("transport must not be called");
        }
    }

    /// Serializer returning a fixed outcome and counting its invocations.
    struct StubSerializer {
        outcome: Result<Option<Response>, SerializerError>,
        calls: AtomicUsize,
    }

    impl StubSerializer {
        fn returning(outcome: Result<Option<Response>, SerializerError>) -> Arc<Self> {
            Arc::new(StubSerializer {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Deserializer for StubSerializer {
        fn deserialize(
            &self,
            _body: &str,
            _format: &str,
        ) -> Result<Option<Response>, SerializerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct PanickingSerializer;

    impl Deserializer for PanickingSerializer {
        fn deserialize(
            &self,
            _body: &str,
            _format: &str,
        ) -> Result<Option<Response>, SerializerError> {
            panic!("serializer must not be called");
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        responses: Mutex<Vec<(u16, LogExtras)>>,
        errors: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        fn responses(&self) -> Vec<(u16, LogExtras)> {
            self.responses.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }
    }

    impl ResponseLogger for RecordingLogger {
        fn log_response(&self, response: &TransportResponse, extras: &LogExtras) {
            self.responses
                .lock()
                .unwrap()
                .push((response.status, *extras));
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn cluster(transport: Arc<dyn Transport>) -> Cluster {
        Cluster::new("http", "riak.test", 8098, transport)
    }

    fn response_with_qtime(qtime: i64) -> Response {
        Response {
            lists: vec![NamedList {
                name: "responseHeader".to_string(),
                values: vec![NamedValue::new("QTime", SimpleValue::Int(qtime))],
                lists: vec![],
            }],
            result: None,
        }
    }

    #[test]
    fn test_config_merges_query_and_connection() {
        let client = SearchClient::new(
            Arc::new(PanickingSerializer),
            Arc::new(RecordingLogger::default()),
        );
        let cluster = cluster(Arc::new(PanickingTransport));
        let query = Query::new("name:miles").with_window(0, 10);

        let config = client.config(&cluster, &Bucket::new("artists"), &query);

        assert_eq!(config.get("protocol"), Some(&"http".to_string()));
        assert_eq!(config.get("domain"), Some(&"riak.test".to_string()));
        assert_eq!(config.get("port"), Some(&"8098".to_string()));
        assert_eq!(config.get("bucket"), Some(&"artists".to_string()));
        assert_eq!(config.get("q"), Some(&"name:miles".to_string()));
        assert_eq!(config.get("rows"), Some(&"10".to_string()));
        assert_eq!(config.get("wt"), Some(&"json".to_string()));
    }

    #[test]
    fn test_config_is_pure() {
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(Arc::new(PanickingSerializer), logger.clone());
        let cluster = cluster(Arc::new(PanickingTransport));
        let bucket = Bucket::new("artists");
        let query = Query::new("name:miles").with_sort("name");

        let first = client.config(&cluster, &bucket, &query);
        let second = client.config(&cluster, &bucket, &query);

        assert_eq!(first, second);
        assert!(logger.responses().is_empty());
        assert!(logger.errors().is_empty());
    }

    #[tokio::test]
    async fn test_raw_string_matches_default_query() {
        let transport = StubTransport::responding(200, "{}");
        let serializer = StubSerializer::returning(Ok(Some(response_with_qtime(3))));
        let client = SearchClient::new(serializer, Arc::new(RecordingLogger::default()));
        let cluster = cluster(transport.clone());
        let bucket = Bucket::new("artists");

        let from_raw = client.search(&cluster, &bucket, "name:miles").await;
        let from_query = client.search(&cluster, &bucket, Query::new("name:miles")).await;

        assert_eq!(from_raw, from_query);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_success_logs_search_time() {
        let transport = StubTransport::responding(200, "{}");
        let serializer = StubSerializer::returning(Ok(Some(response_with_qtime(1500))));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer.clone(), logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await
            .expect("Search failed");

        assert_eq!(response, response_with_qtime(1500));
        assert_eq!(serializer.calls(), 1);

        let logged = logger.responses();
        assert_eq!(logged.len(), 1);
        let (status, extras) = logged[0];
        assert_eq!(status, 200);
        assert_eq!(extras.method, "GET");
        assert!(extras.deserialization_time.is_some());
        assert!((extras.search_time.unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(logger.errors().is_empty());
    }

    #[tokio::test]
    async fn test_success_without_lists_has_no_search_time() {
        let transport = StubTransport::responding(200, "{}");
        let serializer = StubSerializer::returning(Ok(Some(Response::default())));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer, logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await
            .expect("Search failed");

        assert!(response.is_empty());
        let (_, extras) = logger.responses()[0];
        assert!(extras.deserialization_time.is_some());
        assert_eq!(extras.search_time, None);
    }

    #[tokio::test]
    async fn test_absent_deserialization_result_yields_empty_response() {
        let transport = StubTransport::responding(200, "");
        let serializer = StubSerializer::returning(Ok(None));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer, logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await;

        assert_eq!(response, Ok(Response::default()));
        let (_, extras) = logger.responses()[0];
        assert_eq!(extras.search_time, None);
    }

    #[tokio::test]
    async fn test_non_success_status_skips_deserialization() {
        let transport = StubTransport::responding(404, "not found");
        let serializer = StubSerializer::returning(Ok(Some(response_with_qtime(1))));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer.clone(), logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await;

        assert_eq!(response, Ok(Response::default()));
        assert_eq!(serializer.calls(), 0);
        assert_eq!(logger.responses(), vec![(404, LogExtras::new("GET"))]);
        assert!(logger.errors().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_transport_is_propagated() {
        let transport = StubTransport::failing(TransportError::unavailable("connection refused"));
        let serializer = StubSerializer::returning(Ok(None));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer.clone(), logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await;

        assert_eq!(response, Err(SearchError::Unavailable));
        assert_eq!(serializer.calls(), 0);
        assert!(logger.responses().is_empty());
        assert_eq!(
            logger.errors(),
            vec!["Riak is unavailable: connection refused".to_string()]
        );
    }

    #[tokio::test]
    async fn test_request_failure_degrades() {
        let transport = StubTransport::failing(TransportError::request("invalid port number"));
        let client = SearchClient::new(
            StubSerializer::returning(Ok(None)),
            Arc::new(RecordingLogger::default()),
        );

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await;

        assert_eq!(response, Ok(Response::default()));
    }

    #[tokio::test]
    async fn test_serializer_failure_degrades() {
        let transport = StubTransport::responding(200, "<<garbage>>");
        let serializer =
            StubSerializer::returning(Err(SerializerError::malformed("unexpected token")));
        let logger = Arc::new(RecordingLogger::default());
        let client = SearchClient::new(serializer.clone(), logger.clone());

        let response = client
            .search(&cluster(transport), &Bucket::new("artists"), "name:miles")
            .await;

        assert_eq!(response, Ok(Response::default()));
        assert_eq!(serializer.calls(), 1);
        assert!(logger.responses().is_empty());

        let errors = logger.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Unable to execute a search query. Full message is :"));
        assert!(errors[0].contains("unexpected token"));
    }

    #[tokio::test]
    async fn test_search_against_http_json() {
        let mock = MOCK_SERVER.mock(|when, then| {
            when.method(GET)
                .path("/solr/jazz/select")
                .query_param("q", "name:miles")
                .query_param("wt", "json");
            then.status(200)
                .header("content-type", "application/json")
                .body(JSON_BODY);
        });

        let cluster = ClusterConfig {
            domain: MOCK_SERVER.host(),
            port: MOCK_SERVER.port(),
            ..Default::default()
        }
        .build()
        .expect("Failed to build cluster");

        let response = SearchClient::default()
            .search(&cluster, &Bucket::new("jazz"), "name:miles")
            .await
            .expect("Search failed");

        assert_eq!(response.num_found(), 2);
        assert_eq!(response.search_time(), Some(1.5));

        mock.assert();
    }

    #[tokio::test]
    async fn test_search_against_http_xml() {
        let mock = MOCK_SERVER.mock(|when, then| {
            when.method(GET)
                .path("/solr/bebop/select")
                .query_param("wt", "xml")
                .query_param("rows", "2");
            then.status(200).body(XML_BODY);
        });

        let cluster = ClusterConfig {
            domain: MOCK_SERVER.host(),
            port: MOCK_SERVER.port(),
            ..Default::default()
        }
        .build()
        .expect("Failed to build cluster");
        let query = Query::new("name:miles").with_wt("xml").with_window(0, 2);

        let response = SearchClient::default()
            .search(&cluster, &Bucket::new("bebop"), query)
            .await
            .expect("Search failed");

        assert_eq!(response.docs().len(), 2);

        mock.assert();
    }

    #[tokio::test]
    async fn test_search_against_http_error_status() {
        let _m = MOCK_SERVER.mock(|when, then| {
            when.method(GET).path("/solr/unknown/select");
            then.status(500).body("internal error");
        });

        let cluster = ClusterConfig {
            domain: MOCK_SERVER.host(),
            port: MOCK_SERVER.port(),
            ..Default::default()
        }
        .build()
        .expect("Failed to build cluster");

        let response = SearchClient::default()
            .search(&cluster, &Bucket::new("unknown"), "*:*")
            .await;

        assert_eq!(response, Ok(Response::default()));
    }

    #[tokio::test]
    async fn test_search_against_closed_port() {
        let cluster = ClusterConfig {
            domain: "127.0.0.1".to_string(),
            port: 1,
            ..Default::default()
        }
        .build()
        .expect("Failed to build cluster");

        let response = SearchClient::default()
            .search(&cluster, &Bucket::new("artists"), "*:*")
            .await;

        assert_eq!(response, Err(SearchError::Unavailable));
    }
}
