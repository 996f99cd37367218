//! Output module for run summaries and exported files
//!
//! This module handles:
//! - Accumulating and printing harvest statistics
//! - Printing aggregates stored in the database
//! - Writing discovered target lists

pub mod stats;
mod targets;

pub use stats::{format_elapsed, print_statistics, print_stored_statistics, RunStatistics};
pub use targets::write_target_list;
