//! Record types for planning applications
//!
//! # Components
//!
//! - `DiscoveredApplication`: what the search results reveal about an application
//! - `ApplicationRecord`: the stored row, identity plus extracted fields
//! - `ExtractedFields`: the values parsed from a detail page

mod fields;

pub use fields::ExtractedFields;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// An application found on a search results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredApplication {
    /// Source-assigned identifier (the `PARAM0` of the detail link)
    pub northgate_id: i64,

    /// Absolute URL of the detail page
    pub url: String,

    /// The day the search was filtered on
    pub received_date: NaiveDate,
}

/// A planning application as held in the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    pub northgate_id: i64,
    pub url: String,
    pub received_date: Option<NaiveDate>,

    /// When the detail page was last parsed; `None` until the first extraction
    pub extract_datetime: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub fields: ExtractedFields,
}

impl ApplicationRecord {
    /// Identity columns preceding the extracted fields in flat exports
    pub const KEY_COLUMNS: [&'static str; 4] =
        ["northgate_id", "url", "received_date", "extract_datetime"];

    /// A freshly discovered record with nothing extracted yet
    pub fn from_discovered(discovered: &DiscoveredApplication) -> Self {
        Self {
            northgate_id: discovered.northgate_id,
            url: discovered.url.clone(),
            received_date: Some(discovered.received_date),
            extract_datetime: None,
            fields: ExtractedFields::default(),
        }
    }

    /// Whether the detail page has been parsed at least once
    pub fn is_extracted(&self) -> bool {
        self.extract_datetime.is_some()
    }

    /// Full header for flat exports
    pub fn columns() -> Vec<&'static str> {
        Self::KEY_COLUMNS
            .iter()
            .chain(ExtractedFields::FIELD_NAMES.iter())
            .copied()
            .collect()
    }

    /// Flat representation matching `columns()`
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.northgate_id.to_string(),
            self.url.clone(),
            fields::text(&self.received_date),
            self.extract_datetime
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
        ];
        row.extend(self.fields.to_row());
        row
    }
}
