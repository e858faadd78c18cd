//! Discovery of newly received applications
//!
//! The portal only lists applications through a JavaScript-driven search
//! form, so discovery drives a real browser:
//! - `session`: the [`SearchSession`] trait the crawl is written against
//! - `browser`: headless Chromium over CDP implementing it
//! - `machine`: the per-day search state machine and the multi-day crawl
//! - `diagnostics`: where failure screenshots and markup go

mod browser;
mod diagnostics;
mod machine;
mod session;

pub use browser::ChromiumSession;
pub use diagnostics::diagnostic_paths;
pub use machine::{
    discover_recent, parse_result_links, search_dates, DateSearch, DayCrawl, SearchState,
    ID_PARAMETER,
};
pub use session::{result_hrefs, ResultsOutcome, SearchSession};

use crate::storage::StorageError;
use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Errors that can occur while discovering applications
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Browser error: {0}")]
    Browser(#[from] CdpError),

    #[error("Failed to start browser: {0}")]
    Launch(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Timed out after {secs}s waiting for search results")]
    Timeout { secs: u64 },

    #[error("Result link has no application identifier: {0}")]
    InvalidResultLink(String),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Totals for a discovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub days_searched: u32,
    pub pages: u32,
    /// Applications listed on results pages
    pub found: usize,
    /// Of those, applications not previously stored
    pub new: usize,
}
