//! Egress proxy management
//!
//! This module owns the proxy endpoints used for outbound requests and the
//! health model that decides which of them to use:
//! - Uniform random selection among endpoints that are not blacklisted
//! - Graduated blacklisting after repeated failures
//! - Full reset when every endpoint is blacklisted, so a non-empty pool never starves

mod endpoint;
mod pool;

pub use endpoint::{ProxyCredentials, ProxyEndpoint, SelectedProxy};
pub use pool::ProxyPool;
