//! Run statistics and their console rendering
//!
//! `RunStatistics` is accumulated by the orchestrator during a harvest;
//! `StoredStatistics` is read back from the database for `--stats`.

use crate::storage::StoredStatistics;
use std::time::Duration;

/// Counters for one harvest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Items whose pagination was started
    pub items_attempted: u64,

    /// Items with at least one page of records
    pub items_succeeded: u64,

    /// Items with no records, or abandoned on a storage error
    pub items_failed: u64,

    /// Pages that yielded records
    pub pages_fetched: u64,

    /// Records newly stored
    pub records_written: u64,

    /// Cooldowns entered after consecutive timeouts
    pub cooldowns: u32,

    pub elapsed: Duration,

    /// Whether the run stopped on a shutdown request
    pub interrupted: bool,
}

impl RunStatistics {
    /// Share of attempted items that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.items_attempted == 0 {
            return 0.0;
        }
        (self.items_succeeded as f64 / self.items_attempted as f64) * 100.0
    }
}

/// Formats a duration as `1h 02m 03s`, dropping leading zero units
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Items:");
    println!("  Attempted: {}", stats.items_attempted);
    println!("  Succeeded: {}", stats.items_succeeded);
    println!("  Failed: {}", stats.items_failed);
    println!();

    println!("Pages with records: {}", stats.pages_fetched);
    println!("Records written: {}", stats.records_written);
    if stats.cooldowns > 0 {
        println!("Cooldowns: {}", stats.cooldowns);
    }
    println!("Elapsed: {}", format_elapsed(stats.elapsed));
    if stats.interrupted {
        println!("Run was interrupted; partial results were saved");
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} items)",
        stats.success_rate(),
        stats.items_succeeded,
        stats.items_attempted
    );
}

/// Prints the aggregates stored in a database
pub fn print_stored_statistics(stats: &StoredStatistics) {
    println!("=== Stored Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Runs: {}", stats.run_count);
    println!("  Records: {}", stats.total_records);
    println!("  Items: {}", stats.items.len());
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!(
            "  Items: {} attempted, {} succeeded, {} failed",
            run.items_attempted, run.items_succeeded, run.items_failed
        );
        println!("  Records written: {}", run.records_written);
        println!();
    }

    if !stats.items.is_empty() {
        println!("Records by Item:");
        for item in &stats.items {
            let share = if stats.total_records > 0 {
                (item.records as f64 / stats.total_records as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {} ({}): {} records over {} pages ({:.1}%)",
                item.item_name, item.item_id, item.records, item.pages, share
            );
        }
    }
}
