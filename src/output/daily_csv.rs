//! One CSV per received date
//!
//! Layout: `<export-dir>/applications_received/csv/<YYYY-MM-DD>.csv`

use crate::output::atomic::write_csv;
use crate::output::traits::{ExportSummary, Exporter, OutputResult};
use crate::storage::Storage;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub struct DailyCsvExporter {
    pub include_unextracted: bool,
}

impl DailyCsvExporter {
    pub fn path_for(root: &Path, date: NaiveDate) -> PathBuf {
        root.join("applications_received")
            .join("csv")
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }
}

impl Exporter for DailyCsvExporter {
    fn name(&self) -> &'static str {
        "daily-csv"
    }

    fn export(
        &self,
        storage: &dyn Storage,
        root: &Path,
        _today: NaiveDate,
    ) -> OutputResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        let Some((earliest, latest)) = storage.received_date_range()? else {
            return Ok(summary);
        };

        for date in earliest.iter_days().take_while(|date| *date <= latest) {
            let records =
                storage.applications_received_between(date, date, self.include_unextracted)?;
            if records.is_empty() {
                continue;
            }

            write_csv(&Self::path_for(root, date), &records)?;
            summary.files_written += 1;
            summary.records_written += records.len();
        }

        Ok(summary)
    }
}
