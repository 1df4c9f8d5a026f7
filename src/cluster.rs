use std::fmt;
use std::sync::Arc;

use crate::client::Transport;

/// Connection descriptor for a Riak deployment.
///
/// The cluster only describes where Riak lives and which transport reaches
/// it. Search clients read it but never change it.
#[derive(Clone)]
pub struct Cluster {
    protocol: String,
    domain: String,
    port: u16,
    transport: Arc<dyn Transport>,
}

impl Cluster {
    pub fn new(
        protocol: impl Into<String>,
        domain: impl Into<String>,
        port: u16,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Cluster {
            protocol: protocol.into(),
            domain: domain.into(),
            port,
            transport,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The transport used to send requests to this cluster.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("protocol", &self.protocol)
            .field("domain", &self.domain)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.domain, self.port)
    }
}

/// A named partition of the Riak keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: String,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Bucket { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Bucket {
    fn from(name: &str) -> Self {
        Bucket::new(name)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
