//! Response and error logging for search calls.

use tracing::{debug, error, info, warn};

use crate::client::TransportResponse;

/// Longest body excerpt, in characters, attached to a non-success warning.
pub const BODY_EXCERPT_LEN: usize = 256;

/// Diagnostic metadata attached to a logged response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogExtras {
    /// HTTP method of the request.
    pub method: &'static str,
    /// Seconds spent turning the body into a response.
    pub deserialization_time: Option<f64>,
    /// Server-side query time in seconds.
    pub search_time: Option<f64>,
}

impl LogExtras {
    pub fn new(method: &'static str) -> Self {
        LogExtras {
            method,
            deserialization_time: None,
            search_time: None,
        }
    }
}

/// Receives the diagnostics of every search call.
pub trait ResponseLogger: Send + Sync {
    /// Record a response received from Riak.
    fn log_response(&self, response: &TransportResponse, extras: &LogExtras);

    /// Record a failure.
    fn error(&self, message: &str);
}

/// Logger emitting structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ResponseLogger for TracingLogger {
    fn log_response(&self, response: &TransportResponse, extras: &LogExtras) {
        if response.status == 200 {
            info!(
                method = extras.method,
                status = response.status,
                url = %response.url,
                deserialization_time = ?extras.deserialization_time,
                search_time = ?extras.search_time,
                "Riak search response"
            );
        } else {
            warn!(
                method = extras.method,
                status = response.status,
                url = %response.url,
                body = %body_excerpt(&response.body),
                body_len = response.body.len(),
                "Riak search response"
            );
            debug!(body = %response.body, "Riak search response body");
        }
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

/// Leading part of a body, cut at a character boundary.
pub fn body_excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
