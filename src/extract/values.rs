//! Typed value parsing for detail-page text
//!
//! Each function takes the raw text found after a label and returns the
//! typed value, or `None` when the text does not have the expected shape.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Prefix the portal uses for application numbers that are not yet final
pub const PROVISIONAL_PREFIX: &str = "PL/INV";

/// A whole `DD-MM-YYYY` value
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").unwrap());

/// A `DD-MM-YYYY` token at the start of a value, anything may follow
static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}-\d{2}-\d{4})").unwrap());

/// Liverpool outward code plus inward code at the end of an address line
static POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([Ll]\d{1,2}) ?(\d[A-Za-z]{2})\s*$").unwrap()
});

static EASTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Easting\s+(\d{6})").unwrap());

// `.` stops at a newline, so only the first line can match
static NORTHING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*Northing\s+(\d{6})").unwrap());

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5,20}").unwrap());

/// Parses a `DD-MM-YYYY` date
///
/// Returns `None` for anything else, including well-formed text naming an
/// impossible day such as `31-02-2016`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use planning_scraper::extract::parse_date;
///
/// assert_eq!(parse_date("28-02-2016"), NaiveDate::from_ymd_opt(2016, 2, 28));
/// assert_eq!(parse_date("2016-02-28"), None);
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses the `DD-MM-YYYY` token a value starts with
pub fn parse_leading_date(text: &str) -> Option<NaiveDate> {
    let caps = LEADING_DATE.captures(text)?;
    parse_date(&caps[1])
}

/// Whether an application number is still provisional
pub fn is_provisional(application_number: &str) -> bool {
    application_number.starts_with(PROVISIONAL_PREFIX)
}

/// Returns line `index` of a value, trimmed, or `None` if missing or blank
pub fn nth_line(text: &str, index: usize) -> Option<String> {
    text.split('\n')
        .nth(index)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// Splits an address into trimmed, non-blank lines
pub fn address_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Extracts the postcode ending an address line, normalized to `L15 3JL` form
pub fn parse_postcode(line: &str) -> Option<String> {
    let caps = POSTCODE.captures(line)?;
    Some(format!(
        "{} {}",
        caps[1].to_uppercase(),
        caps[2].to_uppercase()
    ))
}

pub fn parse_easting(text: &str) -> Option<i64> {
    EASTING.captures(text)?[1].parse().ok()
}

pub fn parse_northing(text: &str) -> Option<i64> {
    NORTHING.captures(text)?[1].parse().ok()
}

/// First run of 5 to 20 digits in the text
pub fn parse_phone_number(text: &str) -> Option<String> {
    PHONE_NUMBER.find(text).map(|m| m.as_str().to_string())
}
