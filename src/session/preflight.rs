use super::{PageRequest, Transport};
use crate::identity::{Identity, FALLBACK_DESKTOP};
use crate::proxy::{ProxyEndpoint, SelectedProxy};

/// Outcome of checking a proxy list
#[derive(Debug, Default)]
pub struct ProxyCheck {
    /// Endpoints that answered with 200, in input order
    pub working: Vec<ProxyEndpoint>,

    /// Endpoints that did not, with the reason
    pub failed: Vec<(ProxyEndpoint, String)>,
}

/// Fetches `url` through every endpoint and sorts them by result
///
/// Endpoints are checked one after another. Only a 200 response counts as
/// working; any other status or a transport error fails the endpoint.
///
/// # Arguments
///
/// * `transport` - Session transport the check goes through
/// * `endpoints` - Proxies to check
/// * `url` - A plain echo endpoint such as `http://httpbin.org/ip`
pub async fn check_proxies(
    transport: &dyn Transport,
    endpoints: Vec<ProxyEndpoint>,
    url: &str,
) -> ProxyCheck {
    let identity = Identity::new(FALLBACK_DESKTOP);
    let request = PageRequest::get(url);
    let mut check = ProxyCheck::default();

    for (index, endpoint) in endpoints.into_iter().enumerate() {
        let proxy = SelectedProxy::from_endpoint(index, &endpoint);
        match transport.get(&request, &identity, Some(&proxy)).await {
            Ok(response) if response.status == 200 => {
                tracing::debug!("Proxy {} is working", endpoint);
                check.working.push(endpoint);
            }
            Ok(response) => {
                tracing::warn!("Proxy {} answered HTTP {}", endpoint, response.status);
                check
                    .failed
                    .push((endpoint, format!("HTTP {}", response.status)));
            }
            Err(e) => {
                tracing::warn!("Proxy {} failed: {}", endpoint, e);
                check.failed.push((endpoint, format!("{:?} error", e.kind)));
            }
        }
    }

    tracing::info!(
        "Proxy check: {} working, {} failed",
        check.working.len(),
        check.failed.len()
    );
    check
}
