//! Field extractors
//!
//! One function per output field. Every extractor only reads the page, so
//! they can run in any order and a failure in one never affects another.

use crate::extract::document::LabelledFields;
use crate::extract::values::{
    address_lines, is_provisional, nth_line, parse_date, parse_easting, parse_leading_date,
    parse_northing, parse_phone_number, parse_postcode,
};
use crate::record::ExtractedFields;
use chrono::NaiveDate;

pub const APPLICATION_NUMBER: &str = "Application Number";
pub const COMMENTS_UNTIL: &str = "Comments Until";
pub const DATE_OF_COMMITTEE: &str = "Date of Committee";
pub const DECISION: &str = "Decision";
pub const SITE_ADDRESS: &str = "Site Address";
pub const APPLICATION_TYPE: &str = "Application Type";
pub const DEVELOPMENT_TYPE: &str = "Development Type";
pub const PROPOSAL: &str = "Proposal";
pub const CURRENT_STATUS: &str = "Current Status";
pub const APPLICANT: &str = "Applicant";
pub const AGENT: &str = "Agent";
pub const WARDS: &str = "Wards";
pub const LOCATION_CO_ORDINATES: &str = "Location Co ordinates";
pub const PARISHES: &str = "Parishes";
pub const CASE_OFFICER: &str = "Case Officer / Tel";
pub const PLANNING_OFFICER: &str = "Planning Officer";
pub const DETERMINATION_LEVEL: &str = "Determination Level";

/// Runs every extractor against the page
pub fn extract_fields<P: LabelledFields + ?Sized>(page: &P) -> ExtractedFields {
    ExtractedFields {
        application_number_provisional: application_number_provisional(page),
        application_number: application_number(page),
        comments_until_date: comments_until_date(page),
        committee_date: committee_date(page),
        decision: decision(page),
        decision_date: decision_date(page),
        site_address: site_address(page),
        postcode: postcode(page),
        application_type: page.text_after_label(APPLICATION_TYPE),
        development_type: page.text_after_label(DEVELOPMENT_TYPE),
        description: page.text_after_label(PROPOSAL),
        current_status: page.text_after_label(CURRENT_STATUS),
        applicant: page.text_after_label(APPLICANT),
        agent: page.text_after_label(AGENT),
        wards: page.text_after_label(WARDS),
        geo_northing: geo_northing(page),
        geo_easting: geo_easting(page),
        parishes: page.text_after_label(PARISHES),
        case_officer_name: case_officer_name(page),
        case_officer_number: case_officer_number(page),
        planning_officer_name: page.text_after_label(PLANNING_OFFICER),
        determination_level: page.text_after_label(DETERMINATION_LEVEL),
    }
}

pub fn application_number_provisional<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    page.text_after_label(APPLICATION_NUMBER)
        .filter(|number| is_provisional(number))
}

pub fn application_number<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    page.text_after_label(APPLICATION_NUMBER)
        .filter(|number| !is_provisional(number))
}

pub fn comments_until_date<P: LabelledFields + ?Sized>(page: &P) -> Option<NaiveDate> {
    parse_leading_date(&page.text_after_label(COMMENTS_UNTIL)?)
}

pub fn committee_date<P: LabelledFields + ?Sized>(page: &P) -> Option<NaiveDate> {
    parse_date(&page.text_after_label(DATE_OF_COMMITTEE)?)
}

/// The decision text, first line of the `Decision` value
pub fn decision<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    nth_line(&page.text_after_label(DECISION)?, 0)
}

/// The decision date, second line of the `Decision` value
pub fn decision_date<P: LabelledFields + ?Sized>(page: &P) -> Option<NaiveDate> {
    parse_date(&nth_line(&page.text_after_label(DECISION)?, 1)?)
}

pub fn site_address<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    let text = page.text_after_label(SITE_ADDRESS)?;
    let lines = address_lines(&text);
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(", "))
    }
}

/// Postcode taken from the last line of the site address
///
/// A last line that is not a postcode is logged and yields `None`.
pub fn postcode<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    let text = page.text_after_label(SITE_ADDRESS)?;
    let last_line = *address_lines(&text).last()?;

    let postcode = parse_postcode(last_line);
    if postcode.is_none() {
        tracing::warn!("Not a postcode: {:?}", last_line);
    }
    postcode
}

pub fn geo_easting<P: LabelledFields + ?Sized>(page: &P) -> Option<i64> {
    parse_easting(&page.text_after_label(LOCATION_CO_ORDINATES)?)
}

pub fn geo_northing<P: LabelledFields + ?Sized>(page: &P) -> Option<i64> {
    parse_northing(&page.text_after_label(LOCATION_CO_ORDINATES)?)
}

pub fn case_officer_name<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    nth_line(&page.text_after_label(CASE_OFFICER)?, 0)
}

pub fn case_officer_number<P: LabelledFields + ?Sized>(page: &P) -> Option<String> {
    parse_phone_number(&nth_line(&page.text_after_label(CASE_OFFICER)?, 1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Label lookup backed by a map, no markup involved
    struct Labels(HashMap<&'static str, &'static str>);

    impl Labels {
        fn new(pairs: &[(&'static str, &'static str)]) -> Self {
            Self(pairs.iter().copied().collect())
        }
    }

    impl LabelledFields for Labels {
        fn text_after_label(&self, label: &str) -> Option<String> {
            self.0
                .get(label)
                .map(|value| value.trim_end().to_string())
                .filter(|value| !value.is_empty())
        }
    }

    #[test]
    fn test_provisional_number() {
        let page = Labels::new(&[(APPLICATION_NUMBER, "PL/INV/3482/16")]);
        assert_eq!(
            application_number_provisional(&page),
            Some("PL/INV/3482/16".to_string())
        );
        assert_eq!(application_number(&page), None);
    }

    #[test]
    fn test_final_number() {
        let page = Labels::new(&[(APPLICATION_NUMBER, "16F/2687")]);
        assert_eq!(application_number_provisional(&page), None);
        assert_eq!(application_number(&page), Some("16F/2687".to_string()));
    }

    #[test]
    fn test_missing_number() {
        let page = Labels::new(&[]);
        assert_eq!(application_number_provisional(&page), None);
        assert_eq!(application_number(&page), None);
    }

    #[test]
    fn test_decision_and_date() {
        let page = Labels::new(&[(DECISION, "Approved with Conditions\n  28-02-2016")]);
        assert_eq!(decision(&page), Some("Approved with Conditions".to_string()));
        assert_eq!(decision_date(&page), NaiveDate::from_ymd_opt(2016, 2, 28));
    }

    #[test]
    fn test_decision_without_date() {
        let page = Labels::new(&[(DECISION, "Pending")]);
        assert_eq!(decision(&page), Some("Pending".to_string()));
        assert_eq!(decision_date(&page), None);
    }

    #[test]
    fn test_comments_until_with_trailing_text() {
        let page = Labels::new(&[(COMMENTS_UNTIL, "26-10-2016 (extended)")]);
        assert_eq!(
            comments_until_date(&page),
            NaiveDate::from_ymd_opt(2016, 10, 26)
        );
    }

    #[test]
    fn test_committee_date_must_be_whole_value() {
        let page = Labels::new(&[(DATE_OF_COMMITTEE, "26-10-2016 (provisional)")]);
        assert_eq!(committee_date(&page), None);

        let page = Labels::new(&[(DATE_OF_COMMITTEE, "26-10-2016")]);
        assert_eq!(committee_date(&page), NaiveDate::from_ymd_opt(2016, 10, 26));
    }

    #[test]
    fn test_site_address_and_postcode() {
        let page = Labels::new(&[(
            SITE_ADDRESS,
            "\n   12 Dovedale Road\n\n   Liverpool\n   L18 5EP",
        )]);
        assert_eq!(
            site_address(&page),
            Some("12 Dovedale Road, Liverpool, L18 5EP".to_string())
        );
        assert_eq!(postcode(&page), Some("L18 5EP".to_string()));
    }

    #[test]
    fn test_postcode_mismatch_is_none() {
        let page = Labels::new(&[(SITE_ADDRESS, "Land off Speke Road\nSpeke")]);
        assert_eq!(
            site_address(&page),
            Some("Land off Speke Road, Speke".to_string())
        );
        assert_eq!(postcode(&page), None);
    }

    /// Collects everything a `fmt` subscriber writes
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_postcode_mismatch_logs_warning() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let page = Labels::new(&[(SITE_ADDRESS, "Land Adjacent To\nSpeke Hall Avenue\nLiverpool")]);
        let found = tracing::subscriber::with_default(subscriber, || postcode(&page));

        assert_eq!(found, None);
        let output = log.contents();
        assert!(output.contains("WARN"), "unexpected log output: {output}");
        assert!(output.contains("Not a postcode"), "unexpected log output: {output}");
        assert!(output.contains("Liverpool"), "unexpected log output: {output}");
    }

    #[test]
    fn test_postcode_match_logs_nothing() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let page = Labels::new(&[(SITE_ADDRESS, "12 Dovedale Road\nL18 5EP")]);
        let found = tracing::subscriber::with_default(subscriber, || postcode(&page));

        assert_eq!(found, Some("L18 5EP".to_string()));
        assert!(!log.contents().contains("Not a postcode"));
    }

    #[test]
    fn test_site_address_of_only_whitespace() {
        let page = Labels::new(&[(SITE_ADDRESS, "\n  \n")]);
        assert_eq!(site_address(&page), None);
        assert_eq!(postcode(&page), None);
    }

    #[test]
    fn test_coordinates() {
        let page = Labels::new(&[(LOCATION_CO_ORDINATES, "Easting  341987 Northing  386934")]);
        assert_eq!(geo_easting(&page), Some(341987));
        assert_eq!(geo_northing(&page), Some(386934));
    }

    #[test]
    fn test_case_officer() {
        let page = Labels::new(&[(CASE_OFFICER, "Mr John Smith\n 01512333021")]);
        assert_eq!(case_officer_name(&page), Some("Mr John Smith".to_string()));
        assert_eq!(case_officer_number(&page), Some("01512333021".to_string()));
    }

    #[test]
    fn test_case_officer_without_number() {
        let page = Labels::new(&[(CASE_OFFICER, "Not Allocated")]);
        assert_eq!(case_officer_name(&page), Some("Not Allocated".to_string()));
        assert_eq!(case_officer_number(&page), None);
    }

    #[test]
    fn test_plain_fields() {
        let page = Labels::new(&[
            (PROPOSAL, "To erect single storey rear extension"),
            (WARDS, "Church"),
            (AGENT, ""),
        ]);
        let fields = extract_fields(&page);
        assert_eq!(
            fields.description.as_deref(),
            Some("To erect single storey rear extension")
        );
        assert_eq!(fields.wards.as_deref(), Some("Church"));
        assert_eq!(fields.agent, None);
        assert_eq!(fields.parishes, None);
    }

    #[test]
    fn test_empty_page_extracts_nothing() {
        assert!(extract_fields(&Labels::new(&[])).is_empty());
    }
}
