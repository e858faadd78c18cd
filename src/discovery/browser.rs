//! Headless Chromium search session
//!
//! Uses chromiumoxide (CDP) to fill in and page through the portal's
//! advanced search form.

use crate::config::{DiscoveryConfig, PortalConfig};
use crate::discovery::diagnostics::diagnostic_paths;
use crate::discovery::session::{result_hrefs, ResultsOutcome, SearchSession};
use crate::discovery::DiscoveryError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chromiumoxide::handler::Handler;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Picks "Date Received" in the date-type dropdown
const SELECT_DATE_RECEIVED_SCRIPT: &str = r#"
    (() => {
        const select = document.getElementById('cboSelectDateValue');
        if (!select) return false;
        const option = Array.from(select.options).find(o => o.text.trim() === 'Date Received');
        if (!option) return false;
        select.value = option.value;
        select.dispatchEvent(new Event('change', { bubbles: true }));
        return true;
    })()
"#;

/// Reports "table", "none" or "pending"
const RESULTS_STATE_SCRIPT: &str = r#"
    (() => {
        if (document.querySelector("table[summary='Results of the Search']")) return 'table';
        const spans = Array.from(document.querySelectorAll('span'));
        if (spans.some(s => s.textContent.trim() === 'No Records Found')) return 'none';
        return 'pending';
    })()
"#;

/// Clicks the link wrapping the "next page" image, if there is one
const NEXT_PAGE_SCRIPT: &str = r#"
    (() => {
        const img = document.querySelector("img[alt*='Go to next page']");
        if (!img || !img.parentElement) return false;
        img.parentElement.click();
        return true;
    })()
"#;

/// A Chromium tab pointed at the portal's search form
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// Connected to a browser we did not start; leave it running on close
    remote: bool,
    search_url: String,
    date_format: String,
    wait_timeout: Duration,
}

impl ChromiumSession {
    /// Launches Chromium, or connects to `remote-url` when one is configured
    pub async fn start(
        portal: &PortalConfig,
        config: &DiscoveryConfig,
    ) -> Result<Self, DiscoveryError> {
        let (browser, handler, remote) = match &config.remote_url {
            Some(url) => {
                let (browser, handler) = connect_remote(url).await?;
                (browser, handler, true)
            }
            None => {
                let (browser, handler) = launch(config).await?;
                (browser, handler, false)
            }
        };

        let handler = tokio::spawn(drive_handler(handler));
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler,
            remote,
            search_url: portal.search_url.clone(),
            date_format: portal.date_format.clone(),
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
        })
    }

    async fn run_script<T: serde::de::DeserializeOwned>(
        &self,
        script: &str,
    ) -> Result<T, DiscoveryError> {
        self.page
            .evaluate(script.to_string())
            .await?
            .into_value()
            .map_err(|e| DiscoveryError::Script(e.to_string()))
    }

    async fn fill_input(&self, id: &str, value: &str) -> Result<(), DiscoveryError> {
        let _: String = self
            .run_script(&format!("document.getElementById('{}').value = ''", id))
            .await?;

        let input = self.page.find_element(format!("#{}", id)).await?;
        input.click().await?;
        input.type_str(value).await?;
        Ok(())
    }
}

async fn launch(config: &DiscoveryConfig) -> Result<(Browser, Handler), DiscoveryError> {
    info!("Launching browser (headless={})", config.headless);

    let mut builder = BrowserConfig::builder();
    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(executable);
    }
    if !config.headless {
        builder = builder.with_head();
    }

    let browser_config = builder
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .build()
        .map_err(DiscoveryError::Launch)?;

    Ok(Browser::launch(browser_config).await?)
}

/// Connects to a running browser through its DevTools endpoint
async fn connect_remote(url: &str) -> Result<(Browser, Handler), DiscoveryError> {
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let body = reqwest::get(&version_url).await?.text().await?;
    let version: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| DiscoveryError::Launch(e.to_string()))?;
    let ws_url = version
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DiscoveryError::Launch(format!("No webSocketDebuggerUrl at {}", version_url)))?;

    info!("Connecting to browser at {}", ws_url);
    Ok(Browser::connect(ws_url).await?)
}

/// Asks the launched browser to exit and reaps the process
async fn shutdown(browser: &mut Browser) -> Result<(), DiscoveryError> {
    browser.close().await?;
    browser.wait().await?;
    Ok(())
}

/// Awaits `closing`, then aborts the handler task whatever the outcome
async fn stop_after<F>(closing: F, handler: &JoinHandle<()>) -> Result<(), DiscoveryError>
where
    F: Future<Output = Result<(), DiscoveryError>>,
{
    let result = closing.await;
    handler.abort();
    result
}

async fn drive_handler(mut handler: Handler) {
    while let Some(event) = handler.next().await {
        if event.is_err() {
            break;
        }
    }
}

#[async_trait]
impl SearchSession for ChromiumSession {
    async fn open_search_form(&mut self) -> Result<(), DiscoveryError> {
        debug!("Opening {}", self.search_url);
        self.page.goto(self.search_url.clone()).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn submit_date_search(&mut self, date: NaiveDate) -> Result<(), DiscoveryError> {
        let selected: bool = self.run_script(SELECT_DATE_RECEIVED_SCRIPT).await?;
        if !selected {
            return Err(DiscoveryError::Script(
                "'Date Received' option not found".to_string(),
            ));
        }

        self.page.find_element("#rbRange").await?.click().await?;

        let day = date.format(&self.date_format).to_string();
        self.fill_input("dateStart", &day).await?;
        self.fill_input("dateEnd", &day).await?;

        self.page.find_element("#csbtnSearch").await?.click().await?;
        Ok(())
    }

    async fn wait_for_results(&mut self) -> Result<ResultsOutcome, DiscoveryError> {
        let deadline = Instant::now()
            .checked_add(self.wait_timeout)
            .ok_or_else(|| {
                DiscoveryError::Script(format!(
                    "wait timeout of {}s is out of range",
                    self.wait_timeout.as_secs()
                ))
            })?;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let probe = tokio::time::timeout(
                remaining,
                self.page.evaluate(RESULTS_STATE_SCRIPT.to_string()),
            )
            .await;

            if let Ok(Ok(result)) = probe {
                match result.into_value::<String>().as_deref() {
                    Ok("table") => return Ok(ResultsOutcome::Table),
                    Ok("none") => return Ok(ResultsOutcome::NoRecords),
                    _ => {}
                }
            }

            if Instant::now() >= deadline {
                return Err(DiscoveryError::Timeout {
                    secs: self.wait_timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn result_links(&mut self) -> Result<Vec<String>, DiscoveryError> {
        let html = self.page.content().await?;
        Ok(result_hrefs(&html))
    }

    async fn next_page(&mut self) -> Result<bool, DiscoveryError> {
        self.run_script(NEXT_PAGE_SCRIPT).await
    }

    async fn capture_diagnostics(&mut self, dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
        let (screenshot, markup) = diagnostic_paths(dir, Utc::now());

        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), &screenshot)
            .await?;
        let html = self.page.content().await?;
        tokio::fs::write(&markup, html).await?;

        Ok(vec![screenshot, markup])
    }

    async fn close(&mut self) -> Result<(), DiscoveryError> {
        let remote = self.remote;
        let page = self.page.clone();
        let browser = &mut self.browser;
        let closing = async move {
            if remote {
                page.close().await?;
                Ok::<_, DiscoveryError>(())
            } else {
                shutdown(browser).await
            }
        };
        stop_after(closing, &self.handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_stopped_when_close_fails() {
        let handler = tokio::spawn(std::future::pending::<()>());
        let closing = async { Err(DiscoveryError::Launch("browser already gone".to_string())) };

        let result = stop_after(closing, &handler).await;
        assert!(matches!(result, Err(DiscoveryError::Launch(_))));

        let joined = handler.await;
        assert!(joined.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_handler_stopped_after_clean_close() {
        let handler = tokio::spawn(std::future::pending::<()>());

        stop_after(async { Ok(()) }, &handler).await.unwrap();
        assert!(handler.await.unwrap_err().is_cancelled());
    }
}
