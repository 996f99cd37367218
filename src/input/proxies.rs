use crate::proxy::{ProxyCredentials, ProxyEndpoint};
use crate::InputError;
use std::net::Ipv4Addr;
use std::path::Path;

/// Reads a proxy list file
///
/// A missing file yields an empty list (direct connections); the caller
/// decides whether that is acceptable.
pub fn load_proxies(path: &Path) -> Result<Vec<ProxyEndpoint>, InputError> {
    if !path.exists() {
        tracing::warn!(
            "Proxy list {} not found, requests will go direct",
            path.display()
        );
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let proxies = parse_proxy_list(&content);
    tracing::info!("Loaded {} proxies from {}", proxies.len(), path.display());
    Ok(proxies)
}

/// Parses newline-delimited proxies, skipping blank, comment and invalid lines
pub fn parse_proxy_list(content: &str) -> Vec<ProxyEndpoint> {
    content
        .lines()
        .enumerate()
        .filter_map(|(number, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match parse_proxy_line(line) {
                Ok(endpoint) => Some(endpoint),
                Err(e) => {
                    tracing::warn!("Skipping proxy line {}: {}", number + 1, e);
                    None
                }
            }
        })
        .collect()
}

/// Parses `address:port:username:password` (or `address:port`)
///
/// The address must be four dotted-decimal octets in 0–255 and the port in
/// 1–65535.
pub fn parse_proxy_line(line: &str) -> Result<ProxyEndpoint, InputError> {
    let invalid = |reason: &str| InputError::InvalidProxy {
        line: redact(line),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = line.trim().splitn(4, ':').collect();
    let (address, port, credentials) = match parts.as_slice() {
        [address, port] => (*address, *port, None),
        [address, port, username, password] => {
            if username.is_empty() {
                return Err(invalid("empty username"));
            }
            (
                *address,
                *port,
                Some(ProxyCredentials {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
            )
        }
        _ => return Err(invalid("expected address:port:username:password")),
    };

    let address = parse_ipv4(address).ok_or_else(|| invalid("invalid IPv4 address"))?;
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| invalid("port must be 1-65535"))?;

    Ok(ProxyEndpoint::new(address, port, credentials))
}

/// Strict dotted-decimal parse: exactly four numeric octets
fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let octets: Vec<u8> = text
        .split('.')
        .map(|part| {
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                part.parse::<u8>().ok()
            }
        })
        .collect::<Option<Vec<u8>>>()?;

    match octets.as_slice() {
        [a, b, c, d] => Some(Ipv4Addr::new(*a, *b, *c, *d)),
        _ => None,
    }
}

/// Keeps `address:port` and hides credentials in log output
fn redact(line: &str) -> String {
    line.split(':').take(2).collect::<Vec<_>>().join(":")
}
