//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{ApplicationRecord, DiscoveredApplication, ExtractedFields};
use crate::refresh::RefreshCandidate;
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Application not found: {0}")]
    ApplicationNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the scraper.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the outcome of a run along with a finish timestamp
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        discovered: u64,
        extracted: u64,
    ) -> StorageResult<()>;

    // ===== Applications =====

    /// Inserts newly discovered applications in a single transaction
    ///
    /// Known identifiers only get their URL refreshed: extracted fields and
    /// an existing received date are left alone.
    ///
    /// # Returns
    ///
    /// How many of the applications were not in the store before
    fn upsert_discovered(&mut self, applications: &[DiscoveredApplication]) -> StorageResult<usize>;

    /// Overwrites the extracted fields of an application and stamps `extracted_at`
    fn save_extraction(
        &mut self,
        northgate_id: i64,
        fields: &ExtractedFields,
        extracted_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Gets an application by identifier
    fn get_application(&self, northgate_id: i64) -> StorageResult<Option<ApplicationRecord>>;

    /// Lists every application with what the refresh scheduler needs
    fn list_refresh_candidates(&self) -> StorageResult<Vec<RefreshCandidate>>;

    /// Gets the most recent received date in the store
    fn latest_received_date(&self) -> StorageResult<Option<NaiveDate>>;

    /// Gets the earliest and latest received dates in the store
    fn received_date_range(&self) -> StorageResult<Option<(NaiveDate, NaiveDate)>>;

    /// Applications received between `from` and `to` inclusive, ordered by
    /// application number
    fn applications_received_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        include_unextracted: bool,
    ) -> StorageResult<Vec<ApplicationRecord>>;

    /// Applications that have a final application number, ordered by it
    fn applications_with_number(&self) -> StorageResult<Vec<ApplicationRecord>>;

    // ===== Statistics =====

    /// Gets total application count
    fn count_applications(&self) -> StorageResult<u64>;

    /// Counts applications extracted at least once
    fn count_extracted(&self) -> StorageResult<u64>;
}
