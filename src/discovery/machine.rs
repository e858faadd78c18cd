//! The discovery crawl as an explicit state machine
//!
//! For one received date the crawl moves through:
//!
//! ```text
//! AdvancedSearchPage -> ResultsPage(1) -> ResultsPage(2) -> ... -> Done
//!                    \-> NoResults
//! ```
//!
//! Every results page is stored before the next one is requested.

use crate::config::DiscoveryConfig;
use crate::discovery::session::{ResultsOutcome, SearchSession};
use crate::discovery::{DiscoveryError, DiscoveryReport};
use crate::record::DiscoveredApplication;
use crate::storage::Storage;
use chrono::{Duration as Days, NaiveDate};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Query parameter carrying the portal's application identifier
pub const ID_PARAMETER: &str = "PARAM0";

/// Where the crawl for a single day currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// The search form has not been submitted yet
    AdvancedSearchPage,
    /// Showing results page `n` (1-based)
    ResultsPage(u32),
    /// The search matched nothing
    NoResults,
    /// The last results page has been stored
    Done,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoResults | Self::Done)
    }
}

/// Totals for the crawl of one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCrawl {
    pub pages: u32,
    pub found: usize,
    pub new: usize,
}

/// Drives a session through the search for one received date
pub struct DateSearch<'a, S: ?Sized, St: ?Sized> {
    session: &'a mut S,
    storage: &'a mut St,
    search_url: &'a Url,
    date: NaiveDate,
    page_delay: Duration,
    state: SearchState,
    totals: DayCrawl,
}

impl<'a, S, St> DateSearch<'a, S, St>
where
    S: SearchSession + ?Sized,
    St: Storage + ?Sized,
{
    pub fn new(
        session: &'a mut S,
        storage: &'a mut St,
        search_url: &'a Url,
        date: NaiveDate,
        page_delay: Duration,
    ) -> Self {
        Self {
            session,
            storage,
            search_url,
            date,
            page_delay,
            state: SearchState::AdvancedSearchPage,
            totals: DayCrawl::default(),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Performs one transition and returns the new state
    pub async fn step(&mut self) -> Result<SearchState, DiscoveryError> {
        self.state = match self.state {
            SearchState::AdvancedSearchPage => {
                self.session.open_search_form().await?;
                self.session.submit_date_search(self.date).await?;
                match self.session.wait_for_results().await? {
                    ResultsOutcome::Table => SearchState::ResultsPage(1),
                    ResultsOutcome::NoRecords => SearchState::NoResults,
                }
            }
            SearchState::ResultsPage(page) => {
                self.store_current_page(page).await?;

                if self.session.next_page().await? {
                    tokio::time::sleep(self.page_delay).await;
                    match self.session.wait_for_results().await? {
                        ResultsOutcome::Table => SearchState::ResultsPage(page + 1),
                        ResultsOutcome::NoRecords => SearchState::Done,
                    }
                } else {
                    SearchState::Done
                }
            }
            terminal => terminal,
        };

        Ok(self.state)
    }

    /// Steps until a terminal state is reached
    pub async fn run(mut self) -> Result<DayCrawl, DiscoveryError> {
        while !self.state.is_terminal() {
            self.step().await?;
        }

        if self.state == SearchState::NoResults {
            debug!("No applications received on {}", self.date);
        }
        Ok(self.totals)
    }

    async fn store_current_page(&mut self, page: u32) -> Result<(), DiscoveryError> {
        let hrefs = self.session.result_links().await?;
        let applications = parse_result_links(self.search_url, &hrefs, self.date)?;
        let new = self.storage.upsert_discovered(&applications)?;

        debug!(
            "{} page {}: {} applications ({} new)",
            self.date,
            page,
            applications.len(),
            new
        );

        self.totals.pages += 1;
        self.totals.found += applications.len();
        self.totals.new += new;
        Ok(())
    }
}

/// Resolves result links against the search page and reads their identifiers
///
/// A link without a numeric `PARAM0` fails the whole page.
pub fn parse_result_links(
    search_url: &Url,
    hrefs: &[String],
    received_date: NaiveDate,
) -> Result<Vec<DiscoveredApplication>, DiscoveryError> {
    hrefs
        .iter()
        .map(|href| {
            let url = search_url.join(href)?;
            let northgate_id = url
                .query_pairs()
                .find(|(key, _)| key == ID_PARAMETER)
                .and_then(|(_, value)| value.parse::<i64>().ok())
                .ok_or_else(|| DiscoveryError::InvalidResultLink(href.clone()))?;

            Ok(DiscoveredApplication {
                northgate_id,
                url: url.to_string(),
                received_date,
            })
        })
        .collect()
}

/// The received dates searched on `today`: yesterday back to `days_back` days ago
pub fn search_dates(today: NaiveDate, days_back: u32) -> Vec<NaiveDate> {
    (1..=i64::from(days_back))
        .map(|offset| today - Days::days(offset))
        .collect()
}

/// Searches each recent day and stores what the results pages list
///
/// On failure, diagnostics are captured before the error is returned. The
/// session is closed whatever the outcome.
///
/// # Arguments
///
/// * `session` - An open search session
/// * `storage` - Where discovered applications are upserted
/// * `search_url` - The search form URL, used to resolve result links
/// * `config` - Days to cover, page delay and the diagnostics directory
/// * `today` - Searches start the day before this
pub async fn discover_recent<S, St>(
    session: &mut S,
    storage: &mut St,
    search_url: &Url,
    config: &DiscoveryConfig,
    today: NaiveDate,
) -> Result<DiscoveryReport, DiscoveryError>
where
    S: SearchSession + ?Sized,
    St: Storage + ?Sized,
{
    let result = crawl_dates(session, storage, search_url, config, today).await;

    if let Err(e) = &result {
        error!("Discovery failed: {}", e);
        match session
            .capture_diagnostics(Path::new(&config.diagnostics_dir))
            .await
        {
            Ok(paths) => {
                for path in paths {
                    warn!("Saved diagnostics to {}", path.display());
                }
            }
            Err(capture_error) => warn!("Could not capture diagnostics: {}", capture_error),
        }
    }

    if let Err(e) = session.close().await {
        warn!("Failed to close search session: {}", e);
    }

    result
}

async fn crawl_dates<S, St>(
    session: &mut S,
    storage: &mut St,
    search_url: &Url,
    config: &DiscoveryConfig,
    today: NaiveDate,
) -> Result<DiscoveryReport, DiscoveryError>
where
    S: SearchSession + ?Sized,
    St: Storage + ?Sized,
{
    let page_delay = Duration::from_millis(config.page_delay_ms);
    let mut report = DiscoveryReport::default();

    for date in search_dates(today, config.days_back) {
        info!("Searching applications received on {}", date);
        let day = DateSearch::new(&mut *session, &mut *storage, search_url, date, page_delay)
            .run()
            .await?;

        report.days_searched += 1;
        report.pages += day.pages;
        report.found += day.found;
        report.new += day.new;
    }

    Ok(report)
}
