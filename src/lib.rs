//! Planning Scraper: a batch harvester for planning-application portals
//!
//! This crate discovers new planning applications through a portal's search
//! form, re-extracts application detail pages on an age-bucketed schedule,
//! keeps everything in a local SQLite store and exports flat-file snapshots.

pub mod config;
pub mod discovery;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod refresh;
pub mod storage;

use thiserror::Error;

/// Main error type for planning scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] discovery::DiscoveryError),

    #[error("Export error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for planning scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{parse_application_page, ExtractedFields};
pub use record::{ApplicationRecord, DiscoveredApplication};
pub use refresh::{Bucket, RefreshPlan};
