use serde::Deserialize;

/// Main configuration structure for the planning scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// Where the planning portal lives and how its search form expects input
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// URL of the advanced search form
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// chrono format string used when typing dates into the search form
    #[serde(rename = "date-format", default = "default_date_format")]
    pub date_format: String,
}

/// Browser-driven discovery of newly received applications
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// How many days back (starting yesterday) to search
    #[serde(rename = "days-back", default = "default_days_back")]
    pub days_back: u32,

    /// Skip discovery while the newest received date is at most this many days old
    #[serde(rename = "stale-after-days", default = "default_stale_after_days")]
    pub stale_after_days: u32,

    /// Upper bound on waiting for a results page (seconds)
    #[serde(rename = "wait-timeout-secs", default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Pause after following a "next page" link (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Run Chromium without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chromium/Chrome binary
    #[serde(rename = "chrome-executable", default)]
    pub chrome_executable: Option<String>,

    /// DevTools endpoint of an already running browser (e.g. "ws://localhost:9222")
    #[serde(rename = "remote-url", default)]
    pub remote_url: Option<String>,

    /// Where screenshots and page markup are dumped when discovery fails
    #[serde(rename = "diagnostics-dir", default = "default_diagnostics_dir")]
    pub diagnostics_dir: String,
}

/// Detail-page fetching
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// SQLite file holding cached detail-page responses
    #[serde(rename = "cache-path", default = "default_cache_path")]
    pub cache_path: String,

    /// How long a cached response is reused
    #[serde(rename = "cache-ttl-hours", default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Root directory for exported files
    #[serde(rename = "export-dir")]
    pub export_dir: String,

    /// One CSV per received date
    #[serde(rename = "daily-csv", default = "default_true")]
    pub daily_csv: bool,

    /// Year-to-date CSV and JSON snapshot
    #[serde(rename = "year-to-date", default = "default_true")]
    pub year_to_date: bool,

    /// One JSON document per application number
    #[serde(rename = "per-application-json", default = "default_true")]
    pub per_application_json: bool,

    /// Also export records that were discovered but never extracted
    #[serde(rename = "include-unextracted", default)]
    pub include_unextracted: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            stale_after_days: default_stale_after_days(),
            wait_timeout_secs: default_wait_timeout_secs(),
            page_delay_ms: default_page_delay_ms(),
            headless: default_headless(),
            chrome_executable: None,
            remote_url: None,
            diagnostics_dir: default_diagnostics_dir(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            cache_path: default_cache_path(),
            cache_ttl_hours: default_cache_ttl_hours(),
        }
    }
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_days_back() -> u32 {
    29
}

fn default_stale_after_days() -> u32 {
    2
}

fn default_wait_timeout_secs() -> u64 {
    20
}

fn default_page_delay_ms() -> u64 {
    2000
}

fn default_headless() -> bool {
    true
}

fn default_diagnostics_dir() -> String {
    std::env::temp_dir().to_string_lossy().into_owned()
}

fn default_user_agent() -> String {
    format!("planning-scraper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_path() -> String {
    "./cache.sqlite".to_string()
}

fn default_cache_ttl_hours() -> u64 {
    3
}

fn default_true() -> bool {
    true
}
