//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the planning database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scraper runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    discovered INTEGER NOT NULL DEFAULT 0,
    extracted INTEGER NOT NULL DEFAULT 0
);

-- One row per planning application, keyed by the portal's identifier
CREATE TABLE IF NOT EXISTS applications (
    northgate_id INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    received_date TEXT,
    extract_datetime TEXT,
    application_number_provisional TEXT,
    application_number TEXT,
    comments_until_date TEXT,
    committee_date TEXT,
    decision TEXT,
    decision_date TEXT,
    site_address TEXT,
    postcode TEXT,
    application_type TEXT,
    development_type TEXT,
    description TEXT,
    current_status TEXT,
    applicant TEXT,
    agent TEXT,
    wards TEXT,
    geo_northing INTEGER,
    geo_easting INTEGER,
    parishes TEXT,
    case_officer_name TEXT,
    case_officer_number TEXT,
    planning_officer_name TEXT,
    determination_level TEXT
);

CREATE INDEX IF NOT EXISTS idx_applications_received ON applications(received_date);
CREATE INDEX IF NOT EXISTS idx_applications_number ON applications(application_number);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ApplicationRecord;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "applications"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_application_columns_match_record() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('applications')").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(columns, ApplicationRecord::columns());
    }
}
