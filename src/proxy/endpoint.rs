use std::fmt;
use std::net::Ipv4Addr;

/// Basic-auth credentials for a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// One egress proxy and its health counters
///
/// Endpoints are owned by the [`ProxyPool`](super::ProxyPool); counters only
/// change through the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// IPv4 address of the proxy
    pub address: Ipv4Addr,

    /// TCP port of the proxy
    pub port: u16,

    /// Optional basic-auth credentials
    pub credentials: Option<ProxyCredentials>,

    /// Failures attributed to this endpoint since the last reset
    pub(crate) failure_count: u32,

    /// Whether the endpoint is excluded from selection
    pub(crate) blacklisted: bool,
}

impl ProxyEndpoint {
    pub fn new(address: Ipv4Addr, port: u16, credentials: Option<ProxyCredentials>) -> Self {
        Self {
            address,
            port,
            credentials,
            failure_count: 0,
            blacklisted: false,
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    /// `ip:port`, safe to log
    pub fn label(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Handle to the endpoint chosen for one attempt
///
/// Carries what a request needs (address and credentials) plus the pool index
/// used to attribute failures. Counters stay in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProxy {
    pub(crate) index: usize,
    pub address: Ipv4Addr,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

impl SelectedProxy {
    pub(crate) fn from_endpoint(index: usize, endpoint: &ProxyEndpoint) -> Self {
        Self {
            index,
            address: endpoint.address,
            port: endpoint.port,
            credentials: endpoint.credentials.clone(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Proxy URL without credentials, for `reqwest::Proxy` and `--proxy-server`
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

impl fmt::Display for SelectedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
