//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `TargetItem`: One item to harvest and its page cursor
//! - `ItemCursor`: Per-item pagination counters, never shared across items
//! - `TimeoutTracker`: Crawl-wide consecutive network-failure counter behind the cooldown

mod target;
mod timeouts;

// Re-export main types
pub use target::{ItemCursor, TargetItem};
pub use timeouts::TimeoutTracker;
