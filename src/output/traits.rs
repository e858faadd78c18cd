//! Exporter trait and error types
//!
//! This module defines the trait interface for exporters and the types they
//! report back.

use crate::storage::{Storage, StorageError};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move export into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What an export pass wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub files_written: usize,
    pub records_written: usize,
}

impl ExportSummary {
    pub fn add(&mut self, other: ExportSummary) {
        self.files_written += other.files_written;
        self.records_written += other.records_written;
    }
}

/// Trait for one family of export files
pub trait Exporter {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Writes this exporter's files under `root`
    ///
    /// # Arguments
    ///
    /// * `storage` - Where the records come from
    /// * `root` - The configured export directory
    /// * `today` - The date the export is taken on
    fn export(
        &self,
        storage: &dyn Storage,
        root: &Path,
        today: NaiveDate,
    ) -> OutputResult<ExportSummary>;
}
