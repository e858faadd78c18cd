//! Configuration module for the planning scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use planning_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Searching {} days back", config.discovery.days_back);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DiscoveryConfig, ExtractionConfig, OutputConfig, PortalConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
