//! SQLite-backed cache of detail-page responses
//!
//! Entries expire after a fixed time-to-live so a rerun within a few hours
//! does not hit the portal again for pages it has just fetched.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    url TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);
"#;

/// Cached response bodies keyed by URL
pub struct ResponseCache {
    conn: Connection,
    ttl: Duration,
}

impl ResponseCache {
    /// Opens (or creates) the cache file at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite cache file
    /// * `ttl` - How long an entry stays fresh
    pub fn open(path: &Path, ttl: Duration) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(CACHE_SCHEMA_SQL)?;
        Ok(Self { conn, ttl })
    }

    /// Opens a cache that lives only as long as the process
    pub fn open_in_memory(ttl: Duration) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CACHE_SCHEMA_SQL)?;
        Ok(Self { conn, ttl })
    }

    /// Returns the cached body for `url` if it was stored less than `ttl` before `now`
    pub fn get(&self, url: &str, now: DateTime<Utc>) -> Result<Option<String>, rusqlite::Error> {
        let entry: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM responses WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, fetched_at)) = entry else {
            return Ok(None);
        };

        let fresh = DateTime::parse_from_rfc3339(&fetched_at)
            .map(|fetched| now - fetched.with_timezone(&Utc) < self.ttl)
            .unwrap_or(false);

        Ok(fresh.then_some(body))
    }

    /// Stores `body` as the response for `url`, replacing any previous entry
    pub fn put(&self, url: &str, body: &str, now: DateTime<Utc>) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO responses (url, body, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET body = excluded.body, fetched_at = excluded.fetched_at",
            params![url, body, timestamp(now)],
        )?;
        Ok(())
    }

    /// Deletes entries that are no longer fresh, returning how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, rusqlite::Error> {
        // A TTL reaching back past the earliest representable time expires nothing
        let Some(cutoff) = now.checked_sub_signed(self.ttl) else {
            return Ok(0);
        };
        let cutoff = timestamp(cutoff);
        self.conn.execute(
            "DELETE FROM responses WHERE fetched_at <= ?1",
            params![cutoff],
        )
    }
}

// Fixed-width so that text comparison orders timestamps correctly
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
