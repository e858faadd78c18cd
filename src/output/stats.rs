//! Statistics from the planning database
//!
//! This module provides functionality for extracting and displaying
//! store statistics, including how much work each refresh bucket holds.

use crate::refresh::{count_by_bucket, BucketCount};
use crate::storage::{RunRecord, Storage};
use crate::ScraperError;
use chrono::{DateTime, NaiveDate, Utc};

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct ScraperStatistics {
    /// Total number of applications stored
    pub total_applications: u64,

    /// Applications extracted at least once
    pub extracted: u64,

    /// Earliest and latest received dates
    pub received_range: Option<(NaiveDate, NaiveDate)>,

    /// Totals and due counts per refresh bucket
    pub buckets: Vec<BucketCount>,

    /// The most recent run, if any
    pub last_run: Option<RunRecord>,
}

impl ScraperStatistics {
    /// Applications the next run would extract
    pub fn total_due(&self) -> usize {
        self.buckets.iter().map(|count| count.due).sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `now` - Reference time for bucket classification
///
/// # Returns
///
/// * `Ok(ScraperStatistics)` - Successfully loaded statistics
/// * `Err(ScraperError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    now: DateTime<Utc>,
) -> Result<ScraperStatistics, ScraperError> {
    let candidates = storage.list_refresh_candidates()?;

    Ok(ScraperStatistics {
        total_applications: storage.count_applications()?,
        extracted: storage.count_extracted()?,
        received_range: storage.received_date_range()?,
        buckets: count_by_bucket(&candidates, now),
        last_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ScraperStatistics) {
    println!("=== Planning Application Statistics ===\n");

    println!("Overview:");
    println!("  Total applications: {}", stats.total_applications);
    println!("  Extracted: {}", stats.extracted);
    match stats.received_range {
        Some((earliest, latest)) => println!("  Received: {} to {}", earliest, latest),
        None => println!("  Received: (none)"),
    }
    println!();

    println!("Refresh Buckets:");
    for count in &stats.buckets {
        println!(
            "  {:<12} {:>6} stored, {:>6} due",
            count.bucket.name(),
            count.total,
            count.due
        );
    }
    println!("  Due next run: {}", stats.total_due());
    println!();

    if let Some(run) = &stats.last_run {
        println!("Last Run:");
        println!("  #{} {}", run.id, run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!(
            "  Discovered: {}, extracted: {}",
            run.discovered, run.extracted
        );
        println!("  Config hash: {}", run.config_hash);
    }
}
