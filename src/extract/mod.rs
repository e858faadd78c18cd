//! Detail-page extraction
//!
//! This module turns the HTML of one application detail page into
//! [`ExtractedFields`]:
//! - `document`: "text following label X" lookup over the parsed page
//! - `values`: date, postcode, coordinate and phone-number parsing
//! - `fields`: one extractor per output field
//! - `fetcher` / `cache`: HTTP retrieval of detail pages with a response cache

mod cache;
mod document;
mod fetcher;
pub mod fields;
mod values;

pub use crate::record::ExtractedFields;
pub use cache::ResponseCache;
pub use document::{strip_label, ApplicationPage, LabelledFields};
pub use fetcher::{build_http_client, DetailFetcher};
pub use fields::extract_fields;
pub use values::{parse_date, parse_postcode};

/// Parses a detail page into its extracted fields
///
/// Never fails: fields that are missing or malformed come back as `None`.
/// The result does not depend on when it is called; callers stamp the
/// extraction time themselves.
pub fn parse_application_page(html: &str) -> ExtractedFields {
    let page = ApplicationPage::parse(html);
    extract_fields(&page)
}
