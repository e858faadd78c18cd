//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 text.

use crate::record::{ApplicationRecord, DiscoveredApplication, ExtractedFields};
use crate::refresh::RefreshCandidate;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::ScraperError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const APPLICATION_COLUMNS: &str = "northgate_id, url, received_date, extract_datetime, \
    application_number_provisional, application_number, comments_until_date, committee_date, \
    decision, decision_date, site_address, postcode, application_type, development_type, \
    description, current_status, applicant, agent, wards, geo_northing, geo_easting, parishes, \
    case_officer_name, case_officer_number, planning_officer_name, determination_level";

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, discovered, extracted";

// Rediscovery may move the detail URL but must not touch anything else
const UPSERT_DISCOVERED_SQL: &str = "
    INSERT INTO applications (northgate_id, url, received_date) VALUES (?1, ?2, ?3)
    ON CONFLICT(northgate_id) DO UPDATE SET
        url = excluded.url,
        received_date = COALESCE(applications.received_date, excluded.received_date)";

const SAVE_EXTRACTION_SQL: &str = "
    UPDATE applications SET
        extract_datetime = ?2,
        application_number_provisional = ?3,
        application_number = ?4,
        comments_until_date = ?5,
        committee_date = ?6,
        decision = ?7,
        decision_date = ?8,
        site_address = ?9,
        postcode = ?10,
        application_type = ?11,
        development_type = ?12,
        description = ?13,
        current_status = ?14,
        applicant = ?15,
        agent = ?16,
        wards = ?17,
        geo_northing = ?18,
        geo_easting = ?19,
        parishes = ?20,
        case_officer_name = ?21,
        case_officer_number = ?22,
        planning_officer_name = ?23,
        determination_level = ?24
    WHERE northgate_id = ?1";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScraperError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScraperError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScraperError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_applications<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> StorageResult<Vec<ApplicationRecord>> {
        let sql = format!(
            "SELECT {} FROM applications WHERE {} \
             ORDER BY application_number IS NULL, application_number, northgate_id",
            APPLICATION_COLUMNS, where_clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params, record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        discovered: u64,
        extracted: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, discovered = ?3, extracted = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                discovered as i64,
                extracted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Applications =====

    fn upsert_discovered(&mut self, applications: &[DiscoveredApplication]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut known = tx.prepare("SELECT 1 FROM applications WHERE northgate_id = ?1")?;
            let mut upsert = tx.prepare(UPSERT_DISCOVERED_SQL)?;

            for application in applications {
                let exists = known.exists(params![application.northgate_id])?;
                upsert
                    .execute(params![
                        application.northgate_id,
                        application.url,
                        application.received_date.format(DATE_FORMAT).to_string(),
                    ])
                    .inspect_err(|_| tracing::error!("Failed to store {:#?}", application))?;

                if !exists {
                    inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn save_extraction(
        &mut self,
        northgate_id: i64,
        fields: &ExtractedFields,
        extracted_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let updated = self
            .conn
            .execute(
                SAVE_EXTRACTION_SQL,
                params![
                    northgate_id,
                    extracted_at.to_rfc3339(),
                    fields.application_number_provisional,
                    fields.application_number,
                    date_text(fields.comments_until_date),
                    date_text(fields.committee_date),
                    fields.decision,
                    date_text(fields.decision_date),
                    fields.site_address,
                    fields.postcode,
                    fields.application_type,
                    fields.development_type,
                    fields.description,
                    fields.current_status,
                    fields.applicant,
                    fields.agent,
                    fields.wards,
                    fields.geo_northing,
                    fields.geo_easting,
                    fields.parishes,
                    fields.case_officer_name,
                    fields.case_officer_number,
                    fields.planning_officer_name,
                    fields.determination_level,
                ],
            )
            .inspect_err(|_| {
                tracing::error!("Failed to store application {}: {:#?}", northgate_id, fields)
            })?;

        if updated == 0 {
            return Err(StorageError::ApplicationNotFound(northgate_id));
        }
        Ok(())
    }

    fn get_application(&self, northgate_id: i64) -> StorageResult<Option<ApplicationRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM applications WHERE northgate_id = ?1",
                    APPLICATION_COLUMNS
                ),
                params![northgate_id],
                record_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn list_refresh_candidates(&self) -> StorageResult<Vec<RefreshCandidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT northgate_id, url, received_date, extract_datetime
             FROM applications ORDER BY northgate_id",
        )?;

        let candidates = stmt
            .query_map([], |row| {
                Ok(RefreshCandidate {
                    northgate_id: row.get(0)?,
                    url: row.get(1)?,
                    received_date: date_column(row, 2)?,
                    extract_datetime: datetime_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candidates)
    }

    fn latest_received_date(&self) -> StorageResult<Option<NaiveDate>> {
        let latest = self.conn.query_row(
            "SELECT MAX(received_date) FROM applications",
            [],
            |row| date_column(row, 0),
        )?;
        Ok(latest)
    }

    fn received_date_range(&self) -> StorageResult<Option<(NaiveDate, NaiveDate)>> {
        let (earliest, latest) = self.conn.query_row(
            "SELECT MIN(received_date), MAX(received_date) FROM applications",
            [],
            |row| Ok((date_column(row, 0)?, date_column(row, 1)?)),
        )?;
        Ok(earliest.zip(latest))
    }

    fn applications_received_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        include_unextracted: bool,
    ) -> StorageResult<Vec<ApplicationRecord>> {
        self.query_applications(
            "received_date BETWEEN ?1 AND ?2 AND (?3 OR extract_datetime IS NOT NULL)",
            params![
                from.format(DATE_FORMAT).to_string(),
                to.format(DATE_FORMAT).to_string(),
                include_unextracted
            ],
        )
    }

    fn applications_with_number(&self) -> StorageResult<Vec<ApplicationRecord>> {
        self.query_applications("application_number IS NOT NULL", [])
    }

    // ===== Statistics =====

    fn count_applications(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM applications")
    }

    fn count_extracted(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM applications WHERE extract_datetime IS NOT NULL")
    }
}

fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRecord> {
    Ok(ApplicationRecord {
        northgate_id: row.get(0)?,
        url: row.get(1)?,
        received_date: date_column(row, 2)?,
        extract_datetime: datetime_column(row, 3)?,
        fields: ExtractedFields {
            application_number_provisional: row.get(4)?,
            application_number: row.get(5)?,
            comments_until_date: date_column(row, 6)?,
            committee_date: date_column(row, 7)?,
            decision: row.get(8)?,
            decision_date: date_column(row, 9)?,
            site_address: row.get(10)?,
            postcode: row.get(11)?,
            application_type: row.get(12)?,
            development_type: row.get(13)?,
            description: row.get(14)?,
            current_status: row.get(15)?,
            applicant: row.get(16)?,
            agent: row.get(17)?,
            wards: row.get(18)?,
            geo_northing: row.get(19)?,
            geo_easting: row.get(20)?,
            parishes: row.get(21)?,
            case_officer_name: row.get(22)?,
            case_officer_number: row.get(23)?,
            planning_officer_name: row.get(24)?,
            determination_level: row.get(25)?,
        },
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        discovered: row.get::<_, i64>(5)? as u64,
        extracted: row.get::<_, i64>(6)? as u64,
    })
}
