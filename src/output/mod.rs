//! Output module for exporting stored applications
//!
//! This module handles:
//! - Daily CSV files per received date
//! - Year-to-date CSV/JSON snapshots
//! - One JSON file per application number
//! - Statistics for `--stats`
//!
//! Every file is replaced atomically.

mod atomic;
mod daily_csv;
mod snapshot;
pub mod stats;
mod traits;

pub use atomic::{write_atomic, write_csv, write_json};
pub use daily_csv::DailyCsvExporter;
pub use snapshot::{ApplicationJsonExporter, YearToDateExporter};
pub use stats::{load_statistics, print_statistics, ScraperStatistics};
pub use traits::{ExportSummary, Exporter, OutputError, OutputResult};

use crate::config::OutputConfig;
use crate::storage::Storage;
use chrono::NaiveDate;
use std::path::Path;

/// The exporters switched on in the configuration
pub fn configured_exporters(config: &OutputConfig) -> Vec<Box<dyn Exporter>> {
    let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();

    if config.daily_csv {
        exporters.push(Box::new(DailyCsvExporter {
            include_unextracted: config.include_unextracted,
        }));
    }
    if config.year_to_date {
        exporters.push(Box::new(YearToDateExporter {
            include_unextracted: config.include_unextracted,
        }));
    }
    if config.per_application_json {
        exporters.push(Box::new(ApplicationJsonExporter));
    }

    exporters
}

/// Runs every configured exporter
///
/// # Arguments
///
/// * `storage` - The storage backend to export from
/// * `config` - Which exports to write and where
/// * `today` - The date the export is taken on
///
/// # Returns
///
/// * `Ok(ExportSummary)` - Totals across all exporters
/// * `Err(OutputError)` - An exporter failed; files already replaced stay replaced
pub fn export_all(
    storage: &dyn Storage,
    config: &OutputConfig,
    today: NaiveDate,
) -> OutputResult<ExportSummary> {
    let mut total = ExportSummary::default();

    if storage.count_applications()? == 0 {
        tracing::warn!("No applications stored, nothing to export");
        return Ok(total);
    }

    let root = Path::new(&config.export_dir);
    for exporter in configured_exporters(config) {
        let summary = exporter.export(storage, root, today)?;
        tracing::info!(
            "Exported {}: {} files, {} records",
            exporter.name(),
            summary.files_written,
            summary.records_written
        );
        total.add(summary);
    }

    Ok(total)
}
