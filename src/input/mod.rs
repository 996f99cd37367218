//! Loaders for the target list and the proxy list
//!
//! Both loaders skip malformed entries with a warning instead of failing the
//! whole file. A target list with no usable entries is an error.

mod proxies;
mod targets;

pub use proxies::{load_proxies, parse_proxy_line, parse_proxy_list};
pub use targets::{load_targets, parse_targets, TargetEntry};
