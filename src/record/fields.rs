//! Values extracted from one application detail page

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every field the detail-page parser produces, in export order
///
/// `None` means the label was missing, empty, or its value did not match the
/// expected pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub application_number_provisional: Option<String>,
    pub application_number: Option<String>,
    pub comments_until_date: Option<NaiveDate>,
    pub committee_date: Option<NaiveDate>,
    pub decision: Option<String>,
    pub decision_date: Option<NaiveDate>,
    pub site_address: Option<String>,
    pub postcode: Option<String>,
    pub application_type: Option<String>,
    pub development_type: Option<String>,
    pub description: Option<String>,
    pub current_status: Option<String>,
    pub applicant: Option<String>,
    pub agent: Option<String>,
    pub wards: Option<String>,
    pub geo_northing: Option<i64>,
    pub geo_easting: Option<i64>,
    pub parishes: Option<String>,
    pub case_officer_name: Option<String>,
    pub case_officer_number: Option<String>,
    pub planning_officer_name: Option<String>,
    pub determination_level: Option<String>,
}

impl ExtractedFields {
    /// Column names, matching the struct's field order
    pub const FIELD_NAMES: [&'static str; 22] = [
        "application_number_provisional",
        "application_number",
        "comments_until_date",
        "committee_date",
        "decision",
        "decision_date",
        "site_address",
        "postcode",
        "application_type",
        "development_type",
        "description",
        "current_status",
        "applicant",
        "agent",
        "wards",
        "geo_northing",
        "geo_easting",
        "parishes",
        "case_officer_name",
        "case_officer_number",
        "planning_officer_name",
        "determination_level",
    ];

    /// Renders the fields as flat strings (empty for null), in `FIELD_NAMES` order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            text(&self.application_number_provisional),
            text(&self.application_number),
            text(&self.comments_until_date),
            text(&self.committee_date),
            text(&self.decision),
            text(&self.decision_date),
            text(&self.site_address),
            text(&self.postcode),
            text(&self.application_type),
            text(&self.development_type),
            text(&self.description),
            text(&self.current_status),
            text(&self.applicant),
            text(&self.agent),
            text(&self.wards),
            text(&self.geo_northing),
            text(&self.geo_easting),
            text(&self.parishes),
            text(&self.case_officer_name),
            text(&self.case_officer_number),
            text(&self.planning_officer_name),
            text(&self.determination_level),
        ]
    }

    /// True when no field could be extracted at all
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub(crate) fn text<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
