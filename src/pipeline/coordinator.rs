//! Pipeline coordinator - one scheduled batch run
//!
//! A run goes through three strictly sequential phases:
//! - Discovery of newly received applications through the search form
//! - Re-extraction of every application the refresh scheduler finds due
//! - Export of the store to flat files
//!
//! Each run is recorded in the store together with the configuration hash.

use crate::config::Config;
use crate::discovery::{discover_recent, ChromiumSession, DiscoveryReport, SearchSession};
use crate::extract::{parse_application_page, DetailFetcher};
use crate::output::{export_all, ExportSummary};
use crate::refresh::{seed_for_day, RefreshPlan};
use crate::storage::{open_storage, RunStatus, SqliteStorage, Storage, StorageError};
use crate::ScraperError;
use chrono::{NaiveDate, Utc};
use std::path::Path;
use url::Url;

/// Whether a run searches the portal for new applications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Only when the newest received date in the store is stale
    #[default]
    Auto,
    Skip,
    Force,
}

/// What a completed run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,

    /// `None` when discovery was skipped
    pub discovery: Option<DiscoveryReport>,

    /// Detail pages fetched and stored
    pub extracted: usize,

    pub exported: ExportSummary,
}

/// Decides whether discovery should run
///
/// In `Auto` mode discovery is skipped while the latest received date is at
/// most `stale_after_days` days before `today`. An empty store always
/// triggers discovery.
pub fn should_discover(
    mode: DiscoveryMode,
    latest_received: Option<NaiveDate>,
    today: NaiveDate,
    stale_after_days: u32,
) -> bool {
    match mode {
        DiscoveryMode::Skip => false,
        DiscoveryMode::Force => true,
        DiscoveryMode::Auto => match latest_received {
            Some(latest) => (today - latest).num_days() > i64::from(stale_after_days),
            None => true,
        },
    }
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    storage: SqliteStorage,
    fetcher: DetailFetcher,
    discovered: u64,
    extracted: u64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    /// * `config_hash` - Hash of the configuration file, recorded with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Store and response cache are open
    /// * `Err(ScraperError)` - Failed to initialize
    pub fn new(config: Config, config_hash: String) -> Result<Self, ScraperError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        let fetcher = DetailFetcher::from_config(&config.extraction)?;

        Ok(Self {
            config,
            config_hash,
            storage,
            fetcher,
            discovered: 0,
            extracted: 0,
        })
    }

    /// Read access to the store, mostly for reporting
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs discovery, refresh and export, recording the run
    ///
    /// Any failure marks the run as failed before it is returned.
    pub async fn run(&mut self, mode: DiscoveryMode) -> Result<RunReport, ScraperError> {
        let run_id = self.storage.create_run(&self.config_hash)?;
        tracing::info!("Starting run {}", run_id);
        let start_time = std::time::Instant::now();

        self.discovered = 0;
        self.extracted = 0;

        let result = self.run_phases(mode).await;
        let status = if result.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };

        let recorded = self
            .storage
            .finish_run(run_id, status, self.discovered, self.extracted);
        let (discovery, extracted, exported) = settle_run(run_id, result, recorded)?;

        tracing::info!(
            "Run {} completed in {:?}: {} new, {} extracted, {} files exported",
            run_id,
            start_time.elapsed(),
            self.discovered,
            extracted,
            exported.files_written
        );

        Ok(RunReport {
            run_id,
            discovery,
            extracted,
            exported,
        })
    }

    async fn run_phases(
        &mut self,
        mode: DiscoveryMode,
    ) -> Result<(Option<DiscoveryReport>, usize, ExportSummary), ScraperError> {
        let today = Utc::now().date_naive();

        let latest = self.storage.latest_received_date()?;
        let discovery = if should_discover(
            mode,
            latest,
            today,
            self.config.discovery.stale_after_days,
        ) {
            let mut session =
                ChromiumSession::start(&self.config.portal, &self.config.discovery).await?;
            Some(self.discover(&mut session, today).await?)
        } else {
            tracing::info!(
                "Skipping discovery (latest received date: {})",
                latest.map_or_else(|| "none".to_string(), |date| date.to_string())
            );
            None
        };

        let extracted = self.refresh().await?;
        let exported = self.export(today)?;

        Ok((discovery, extracted, exported))
    }

    /// Searches the portal for applications received before `today`
    ///
    /// The session is closed before this returns, whatever the outcome.
    pub async fn discover<S>(
        &mut self,
        session: &mut S,
        today: NaiveDate,
    ) -> Result<DiscoveryReport, ScraperError>
    where
        S: SearchSession + ?Sized,
    {
        let search_url = Url::parse(&self.config.portal.search_url)?;
        let stored_before = self.storage.count_applications()?;
        let result = discover_recent(
            session,
            &mut self.storage,
            &search_url,
            &self.config.discovery,
            today,
        )
        .await;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                // Pages stored before the failure still count towards the run
                match self.storage.count_applications() {
                    Ok(stored_after) => {
                        self.discovered += stored_after.saturating_sub(stored_before)
                    }
                    Err(count_error) => tracing::warn!(
                        "Could not count applications stored before discovery failed: {}",
                        count_error
                    ),
                }
                return Err(e.into());
            }
        };

        self.discovered += report.new as u64;
        tracing::info!(
            "Discovery searched {} days over {} pages: {} found, {} new",
            report.days_searched,
            report.pages,
            report.found,
            report.new
        );

        Ok(report)
    }

    /// Fetches and re-extracts every application that is due
    ///
    /// The first fetch failure aborts the refresh; pages already stored stay
    /// stored.
    pub async fn refresh(&mut self) -> Result<usize, ScraperError> {
        let now = Utc::now();
        let candidates = self.storage.list_refresh_candidates()?;
        let plan = RefreshPlan::build(candidates, now, seed_for_day(now.date_naive()));

        let total = plan.len();
        tracing::info!("{} of the stored applications are due for extraction", total);

        let mut done = 0;
        for candidate in plan.into_queue() {
            let html = self.fetcher.fetch_application_page(&candidate.url).await?;
            let fields = parse_application_page(&html);

            self.storage
                .save_extraction(candidate.northgate_id, &fields, Utc::now())?;
            self.extracted += 1;
            done += 1;

            // Progress reporting every 10 pages
            if done % 10 == 0 {
                tracing::info!("Progress: {} of {} extracted", done, total);
            }
        }

        Ok(done)
    }

    /// Writes every configured export family
    pub fn export(&self, today: NaiveDate) -> Result<ExportSummary, ScraperError> {
        Ok(export_all(&self.storage, &self.config.output, today)?)
    }
}

/// Combines the phase outcome with the result of recording the run
///
/// A phase error takes precedence over a failure to record it.
fn settle_run<T>(
    run_id: i64,
    phases: Result<T, ScraperError>,
    recorded: Result<(), StorageError>,
) -> Result<T, ScraperError> {
    match (phases, recorded) {
        (Ok(phases), Ok(())) => Ok(phases),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), recorded) => {
            if let Err(record_error) = recorded {
                tracing::error!("Could not record run {} as failed: {}", run_id, record_error);
            }
            tracing::error!("Run {} failed: {}", run_id, e);
            Err(e)
        }
    }
}

/// Runs a complete batch operation
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `config_hash` - Hash of the configuration file
/// * `mode` - Whether to search the portal for new applications
///
/// # Returns
///
/// * `Ok(RunReport)` - Run completed successfully
/// * `Err(ScraperError)` - Run failed (and was recorded as failed)
pub async fn run_pipeline(
    config: Config,
    config_hash: String,
    mode: DiscoveryMode,
) -> Result<RunReport, ScraperError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run(mode).await
}
