//! Where failure diagnostics are written

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Screenshot and markup paths for a failure captured at `at`
pub fn diagnostic_paths(dir: &Path, at: DateTime<Utc>) -> (PathBuf, PathBuf) {
    let stem = format!("discovery-failure-{}", at.format("%Y%m%dT%H%M%S"));
    (
        dir.join(format!("{}.png", stem)),
        dir.join(format!("{}.html", stem)),
    )
}
