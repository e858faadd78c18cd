//! Year-to-date and per-application snapshots
//!
//! Layout:
//! - `<export-dir>/applications_received/<YYYY>-to-date.csv` and `.json`
//! - `<export-dir>/applications/<application number>.json`

use crate::output::atomic::{write_csv, write_json};
use crate::output::traits::{ExportSummary, Exporter, OutputResult};
use crate::storage::Storage;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

/// Every application received this calendar year, as CSV and JSON
pub struct YearToDateExporter {
    pub include_unextracted: bool,
}

impl YearToDateExporter {
    pub fn paths_for(root: &Path, year: i32) -> (PathBuf, PathBuf) {
        let dir = root.join("applications_received");
        (
            dir.join(format!("{}-to-date.csv", year)),
            dir.join(format!("{}-to-date.json", year)),
        )
    }
}

impl Exporter for YearToDateExporter {
    fn name(&self) -> &'static str {
        "year-to-date"
    }

    fn export(
        &self,
        storage: &dyn Storage,
        root: &Path,
        today: NaiveDate,
    ) -> OutputResult<ExportSummary> {
        let start_of_year = today.with_ordinal(1).unwrap_or(today);
        let records =
            storage.applications_received_between(start_of_year, today, self.include_unextracted)?;

        let (csv_path, json_path) = Self::paths_for(root, today.year());
        write_csv(&csv_path, &records)?;
        write_json(&json_path, &records)?;

        Ok(ExportSummary {
            files_written: 2,
            records_written: records.len(),
        })
    }
}

/// One JSON document per application with a final number
pub struct ApplicationJsonExporter;

impl ApplicationJsonExporter {
    /// `16F/2687` is written as `16F-2687.json`
    pub fn path_for(root: &Path, application_number: &str) -> PathBuf {
        root.join("applications")
            .join(format!("{}.json", application_number.replace('/', "-")))
    }
}

impl Exporter for ApplicationJsonExporter {
    fn name(&self) -> &'static str {
        "per-application-json"
    }

    fn export(
        &self,
        storage: &dyn Storage,
        root: &Path,
        _today: NaiveDate,
    ) -> OutputResult<ExportSummary> {
        let mut summary = ExportSummary::default();

        for record in storage.applications_with_number()? {
            let Some(number) = record.fields.application_number.as_deref() else {
                continue;
            };
            write_json(&Self::path_for(root, number), &record)?;
            summary.files_written += 1;
            summary.records_written += 1;
        }

        Ok(summary)
    }
}
