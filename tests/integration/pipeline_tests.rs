//! Integration tests for the batch pipeline
//!
//! These tests use wiremock to serve detail pages and run the refresh and
//! export phases end-to-end against a temporary database.

use chrono::{Datelike, NaiveDate, Utc};
use planning_scraper::config::{Config, DiscoveryConfig, ExtractionConfig, OutputConfig, PortalConfig};
use planning_scraper::output::{ApplicationJsonExporter, DailyCsvExporter, YearToDateExporter};
use planning_scraper::pipeline::{Coordinator, DiscoveryMode};
use planning_scraper::storage::{RunStatus, SqliteStorage, Storage};
use planning_scraper::DiscoveredApplication;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAILS_PATH: &str = "/PlanningExplorer17/Generic/StdDetails.aspx";

const PAGES: [(i64, &str); 3] = [
    (581001, include_str!("../fixtures/application_pages/001.html")),
    (581002, include_str!("../fixtures/application_pages/002_comments_closed.html")),
    (581003, include_str!("../fixtures/application_pages/003_comments_open.html")),
];

/// Creates a test configuration with everything under `dir`
fn create_test_config(dir: &TempDir, server: &MockServer) -> Config {
    let file = |name: &str| dir.path().join(name).to_string_lossy().into_owned();

    Config {
        portal: PortalConfig {
            search_url: format!("{}/PlanningExplorer17/GeneralSearch.aspx", server.uri()),
            date_format: "%d/%m/%Y".to_string(),
        },
        discovery: DiscoveryConfig::default(),
        extraction: ExtractionConfig {
            user_agent: "planning-scraper-tests".to_string(),
            timeout_secs: 5,
            cache_path: file("cache.sqlite"),
            cache_ttl_hours: 3,
        },
        output: OutputConfig {
            database_path: file("db.sqlite"),
            export_dir: file("planning-data"),
            daily_csv: true,
            year_to_date: true,
            per_application_json: true,
            include_unextracted: false,
        },
    }
}

/// Stores the fixture applications as if discovery had just found them
fn seed_discovered(config: &Config, server: &MockServer, received: NaiveDate) {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let applications: Vec<DiscoveredApplication> = PAGES
        .iter()
        .map(|(id, _)| DiscoveredApplication {
            northgate_id: *id,
            url: format!("{}{}?PARAM0={}", server.uri(), DETAILS_PATH, id),
            received_date: received,
        })
        .collect();

    assert_eq!(storage.upsert_discovered(&applications).unwrap(), 3);
}

async fn mount_detail_pages(server: &MockServer) {
    for (id, html) in PAGES {
        Mock::given(method("GET"))
            .and(path(DETAILS_PATH))
            .and(query_param("PARAM0", id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_run_without_discovery_extracts_and_exports() {
    let mock_server = MockServer::start().await;
    mount_detail_pages(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&dir, &mock_server);
    let today = Utc::now().date_naive();
    seed_discovered(&config, &mock_server, today);

    let export_dir = config.output.export_dir.clone();
    let mut coordinator = Coordinator::new(config, "test-hash".to_string()).unwrap();
    let report = coordinator.run(DiscoveryMode::Skip).await.unwrap();

    assert_eq!(report.discovery, None);
    assert_eq!(report.extracted, 3);

    // Stored fields
    let storage = coordinator.storage();
    let decided = storage.get_application(581002).unwrap().unwrap();
    assert!(decided.is_extracted());
    assert_eq!(decided.fields.application_number.as_deref(), Some("16F/2687"));
    assert_eq!(decided.received_date, Some(today));

    let provisional = storage.get_application(581001).unwrap().unwrap();
    assert_eq!(
        provisional.fields.application_number_provisional.as_deref(),
        Some("PL/INV/3482/16")
    );

    // Run bookkeeping
    let run = storage.get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.extracted, 3);
    assert_eq!(run.discovered, 0);
    assert_eq!(run.config_hash, "test-hash");

    // Exported files
    let root = Path::new(&export_dir);
    let mut daily = csv::Reader::from_path(DailyCsvExporter::path_for(root, today)).unwrap();
    assert_eq!(daily.records().count(), 3);

    let (ytd_csv, ytd_json) = YearToDateExporter::paths_for(root, today.year());
    assert!(ytd_csv.exists());
    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ytd_json).unwrap()).unwrap();
    assert_eq!(snapshot.as_array().unwrap().len(), 3);

    assert!(ApplicationJsonExporter::path_for(root, "16F/2687").exists());
    assert!(ApplicationJsonExporter::path_for(root, "16H/2670").exists());
    assert_eq!(std::fs::read_dir(root.join("applications")).unwrap().count(), 2);
}

#[tokio::test]
async fn test_second_run_on_same_day_fetches_nothing() {
    let mock_server = MockServer::start().await;
    mount_detail_pages(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&dir, &mock_server);
    seed_discovered(&config, &mock_server, Utc::now().date_naive());

    let mut coordinator = Coordinator::new(config, "test-hash".to_string()).unwrap();
    let first = coordinator.run(DiscoveryMode::Skip).await.unwrap();
    let second = coordinator.run(DiscoveryMode::Skip).await.unwrap();

    assert_eq!(first.extracted, 3);
    assert_eq!(second.extracted, 0);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(second.exported.files_written, first.exported.files_written);
}

#[tokio::test]
async fn test_fetch_failure_marks_run_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DETAILS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&dir, &mock_server);
    seed_discovered(&config, &mock_server, Utc::now().date_naive());

    let export_dir = config.output.export_dir.clone();
    let mut coordinator = Coordinator::new(config, "test-hash".to_string()).unwrap();
    let result = coordinator.run(DiscoveryMode::Skip).await;
    assert!(result.is_err());

    let storage = coordinator.storage();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.extracted, 0);
    assert_eq!(storage.count_extracted().unwrap(), 0);

    // Export is never reached
    assert!(!Path::new(&export_dir).exists());
}

#[tokio::test]
async fn test_rediscovery_keeps_extracted_fields() {
    let mock_server = MockServer::start().await;
    mount_detail_pages(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&dir, &mock_server);
    let today = Utc::now().date_naive();
    seed_discovered(&config, &mock_server, today);

    let mut coordinator = Coordinator::new(config.clone(), "test-hash".to_string()).unwrap();
    coordinator.run(DiscoveryMode::Skip).await.unwrap();

    // A later search lists the same application under another date
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let again = DiscoveredApplication {
        northgate_id: 581002,
        url: format!("{}{}?PARAM0=581002", mock_server.uri(), DETAILS_PATH),
        received_date: today.pred_opt().unwrap(),
    };
    assert_eq!(storage.upsert_discovered(&[again]).unwrap(), 0);

    let record = storage.get_application(581002).unwrap().unwrap();
    assert_eq!(record.received_date, Some(today));
    assert_eq!(record.fields.application_number.as_deref(), Some("16F/2687"));
}
