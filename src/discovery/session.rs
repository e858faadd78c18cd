//! The browser operations discovery needs from a search session

use crate::discovery::DiscoveryError;
use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};

/// What a submitted search settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsOutcome {
    /// A results table is showing
    Table,
    /// The portal reported "No Records Found"
    NoRecords,
}

/// A live session against the portal's search UI
///
/// Implemented by [`ChromiumSession`](crate::discovery::ChromiumSession) for
/// real runs; the crawl state machine only talks to this trait.
#[async_trait]
pub trait SearchSession: Send {
    /// Navigates to the advanced search form
    async fn open_search_form(&mut self) -> Result<(), DiscoveryError>;

    /// Selects "Date Received", sets the range to the single `date` and submits
    async fn submit_date_search(&mut self, date: NaiveDate) -> Result<(), DiscoveryError>;

    /// Polls until a results table or the no-records marker appears
    ///
    /// Fails with [`DiscoveryError::Timeout`] when neither shows up in time.
    async fn wait_for_results(&mut self) -> Result<ResultsOutcome, DiscoveryError>;

    /// The `href`s of the application links on the current results page
    async fn result_links(&mut self) -> Result<Vec<String>, DiscoveryError>;

    /// Follows the "next page" control
    ///
    /// Returns `false` when the current page is the last one.
    async fn next_page(&mut self) -> Result<bool, DiscoveryError>;

    /// Writes a screenshot and the page markup into `dir`
    async fn capture_diagnostics(&mut self, dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError>;

    /// Releases the browser
    async fn close(&mut self) -> Result<(), DiscoveryError>;
}

/// Collects application link targets from the markup of a results page
pub fn result_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("td[title='View Application Details'] a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_hrefs() {
        let html = r#"<table summary="Results of the Search"><tbody>
            <tr><td title="View Application Details"><a href="Generic/StdDetails.aspx?PT=Planning%20Applications%20On-Line&amp;PARAM0=581234">16F/2687</a></td><td>Woolton</td></tr>
            <tr><td title="View Application Details"><a href="Generic/StdDetails.aspx?PT=Planning%20Applications%20On-Line&amp;PARAM0=581240">16F/2690</a></td><td>Church</td></tr>
            <tr><td><a href="Help.aspx">Help</a></td></tr>
        </tbody></table>"#;

        assert_eq!(
            result_hrefs(html),
            vec![
                "Generic/StdDetails.aspx?PT=Planning%20Applications%20On-Line&PARAM0=581234",
                "Generic/StdDetails.aspx?PT=Planning%20Applications%20On-Line&PARAM0=581240",
            ]
        );
    }

    #[test]
    fn test_result_hrefs_empty_page() {
        assert!(result_hrefs("<html><body><span>No Records Found</span></body></html>").is_empty());
    }
}
