//! Atomic file replacement
//!
//! Exports are written to a temporary file in the destination directory and
//! renamed over the target, so readers never see a half-written file.

use crate::output::traits::OutputResult;
use crate::record::ApplicationRecord;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `path` through a temporary sibling file
pub fn write_atomic<F>(path: &Path, write: F) -> OutputResult<()>
where
    F: FnOnce(&mut dyn Write) -> OutputResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    write(&mut temp)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Writes records as CSV with the full column header
pub fn write_csv(path: &Path, records: &[ApplicationRecord]) -> OutputResult<()> {
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(ApplicationRecord::columns())?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Writes any serializable value as pretty-printed JSON
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    write_atomic(path, |out| {
        serde_json::to_writer_pretty(&mut *out, value)?;
        out.write_all(b"\n")?;
        Ok(())
    })
}
