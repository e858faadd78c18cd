//! Integration tests for detail-page extraction
//!
//! Each fixture is a saved application detail page; the tests pin the exact
//! field mapping it produces.

use chrono::NaiveDate;
use planning_scraper::{parse_application_page, ExtractedFields};

const PROVISIONAL: &str = include_str!("../fixtures/application_pages/001.html");
const COMMENTS_CLOSED: &str = include_str!("../fixtures/application_pages/002_comments_closed.html");
const COMMENTS_OPEN: &str = include_str!("../fixtures/application_pages/003_comments_open.html");
const DECIDED: &str = include_str!("../fixtures/application_pages/004_decided.html");
const COMMITTEE_PENDING: &str =
    include_str!("../fixtures/application_pages/005_committee_pending.html");
const PROVISIONAL_WITH_COORDINATES: &str =
    include_str!("../fixtures/application_pages/006_provisional_with_coordinates.html");

const ALL_PAGES: [&str; 6] = [
    PROVISIONAL,
    COMMENTS_CLOSED,
    COMMENTS_OPEN,
    DECIDED,
    COMMITTEE_PENDING,
    PROVISIONAL_WITH_COORDINATES,
];

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

#[test]
fn test_provisional_application_page() {
    let expected = ExtractedFields {
        application_number_provisional: text("PL/INV/3482/16"),
        application_number: None,
        comments_until_date: None,
        committee_date: None,
        decision: None,
        decision_date: None,
        site_address: text("461 Smithdown Road, Wavertree, LIVERPOOL, L15 3JL"),
        postcode: text("L15 3JL"),
        application_type: text("Full Planning Permission"),
        development_type: None,
        description: text(
            "Change of use from a small Builders Merchant (A1) to a Public house with food \
             offer and Nano Brewery (A3/A4) with rentable space for cultural events, film \
             screenings, etc...",
        ),
        current_status: text("On-line"),
        applicant: text("Mr Andrew James"),
        agent: None,
        wards: None,
        geo_northing: None,
        geo_easting: None,
        parishes: None,
        case_officer_name: None,
        case_officer_number: None,
        planning_officer_name: None,
        determination_level: None,
    };

    assert_eq!(parse_application_page(PROVISIONAL), expected);
}

#[test]
fn test_comments_closed_page() {
    let expected = ExtractedFields {
        application_number_provisional: None,
        application_number: text("16F/2687"),
        comments_until_date: NaiveDate::from_ymd_opt(2016, 10, 26),
        committee_date: None,
        decision: None,
        decision_date: None,
        site_address: text("McDonald's Restaurant, Hunts Cross Shopping Park, Liverpool, L24 9GB"),
        postcode: text("L24 9GB"),
        application_type: text("Full Planning Permission"),
        development_type: text("alterations to building"),
        description: text("To install new sliding door entrance"),
        current_status: text("REGISTERED"),
        applicant: text("McDonald's Restaurant"),
        agent: None,
        wards: text("Allerton and Hunts Cross"),
        geo_northing: Some(384865),
        geo_easting: Some(342314),
        parishes: text("City South"),
        case_officer_name: text("Jon Woodward"),
        case_officer_number: text("01512333021"),
        planning_officer_name: text("Jon Woodward"),
        determination_level: None,
    };

    assert_eq!(parse_application_page(COMMENTS_CLOSED), expected);
}

#[test]
fn test_comments_open_page() {
    let expected = ExtractedFields {
        application_number_provisional: None,
        application_number: text("16H/2670"),
        comments_until_date: NaiveDate::from_ymd_opt(2016, 12, 8),
        committee_date: None,
        decision: None,
        decision_date: None,
        site_address: text("Woolton Wood Lodge, 7B High Street, Liverpool, L25 7TD"),
        postcode: text("L25 7TD"),
        application_type: text("Household"),
        development_type: text("extension/addition: 1-storey"),
        description: text(
            "To erect single storey extension at the read, garden store, terrace and patio",
        ),
        current_status: text("REGISTERED"),
        applicant: text("Mr & Mrs Andrew Chittenden"),
        agent: None,
        wards: text("Woolton"),
        geo_northing: Some(386592),
        geo_easting: Some(342208),
        parishes: text("City South"),
        case_officer_name: text("Caroline Maher"),
        case_officer_number: text("01512333021"),
        planning_officer_name: text("Caroline Maher"),
        determination_level: None,
    };

    assert_eq!(parse_application_page(COMMENTS_OPEN), expected);
}

#[test]
fn test_decided_application_page() {
    let expected = ExtractedFields {
        application_number_provisional: None,
        application_number: text("16F/2687"),
        comments_until_date: NaiveDate::from_ymd_opt(2016, 9, 14),
        committee_date: None,
        decision: text("Approved with Conditions"),
        decision_date: NaiveDate::from_ymd_opt(2016, 10, 5),
        site_address: text("12 Dovedale Road, Mossley Hill, Liverpool, L18 5EP"),
        postcode: text("L18 5EP"),
        application_type: text("Householder"),
        development_type: text("Minor Alterations"),
        description: text("To erect single storey rear extension"),
        current_status: text("Decided"),
        applicant: text("Mr Andrew James"),
        agent: text("Design Associates Ltd"),
        wards: text("Mossley Hill"),
        geo_northing: Some(387345),
        geo_easting: Some(339420),
        parishes: None,
        case_officer_name: text("Jane Smith"),
        case_officer_number: text("01512333021"),
        planning_officer_name: text("Jane Smith"),
        determination_level: text("Delegated"),
    };

    assert_eq!(parse_application_page(DECIDED), expected);
}

#[test]
fn test_committee_pending_page() {
    let expected = ExtractedFields {
        application_number_provisional: None,
        application_number: text("16H/0012"),
        comments_until_date: NaiveDate::from_ymd_opt(2016, 11, 2),
        committee_date: NaiveDate::from_ymd_opt(2016, 11, 24),
        decision: None,
        decision_date: None,
        site_address: text("Land Adjacent To, Speke Hall Avenue, Liverpool"),
        // Last address line is not a postcode
        postcode: None,
        application_type: text("Outline Planning Permission"),
        development_type: text("Major Dwellings"),
        description: text("To erect 42 dwellings with associated access and landscaping"),
        current_status: text("Awaiting Decision"),
        applicant: text("Redrow Homes NW"),
        agent: text("Smith & Partners"),
        wards: text("Speke-Garston"),
        geo_northing: Some(383120),
        geo_easting: Some(343210),
        parishes: None,
        case_officer_name: text("Tom Brown"),
        case_officer_number: text("01512334567"),
        planning_officer_name: None,
        determination_level: text("Committee"),
    };

    assert_eq!(parse_application_page(COMMITTEE_PENDING), expected);
}

#[test]
fn test_provisional_page_with_coordinates() {
    let fields = parse_application_page(PROVISIONAL_WITH_COORDINATES);

    assert_eq!(fields.application_number_provisional.as_deref(), Some("PL/INV/3482/16"));
    assert_eq!(fields.application_number, None);
    assert_eq!(fields.postcode.as_deref(), Some("L17 3BL"));
    assert_eq!(fields.geo_easting, Some(337456));
    assert_eq!(fields.geo_northing, Some(388812));
}

#[test]
fn test_parsing_is_idempotent() {
    for page in ALL_PAGES {
        assert_eq!(parse_application_page(page), parse_application_page(page));
    }
}

#[test]
fn test_provisional_and_final_numbers_are_exclusive() {
    for page in ALL_PAGES {
        let fields = parse_application_page(page);
        assert!(
            fields.application_number_provisional.is_none() || fields.application_number.is_none()
        );
    }
}

#[test]
fn test_page_without_fields() {
    let fields = parse_application_page("<html><body><p>Application not found</p></body></html>");
    assert_eq!(fields, ExtractedFields::default());
}
