//! JSON archive of a run's summary records.
//!
//! The archive mirrors what was sent to the datastore, so a run can be
//! inspected even when persistence was disabled or failed.

use crate::models::SummaryRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct RunArchive {
    /// The run date in `YYYY-MM-DD` format (UTC).
    pub run_date: String,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<SummaryRecord>,
}

impl RunArchive {
    pub fn new(records: &[SummaryRecord], generated_at: DateTime<Utc>) -> Self {
        Self {
            run_date: generated_at.date_naive().to_string(),
            generated_at,
            records: records.to_vec(),
        }
    }

    /// `{dir}/{YYYY-MM-DD}/{HHMMSS}.json`
    pub fn path_in(&self, json_output_dir: &str) -> PathBuf {
        Path::new(json_output_dir)
            .join(&self.run_date)
            .join(format!("{}.json", self.generated_at.format("%H%M%S")))
    }
}

/// Write `archive` below `json_output_dir`, creating the date directory.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_archive(
    archive: &RunArchive,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(archive)?;
    let path = archive.path_in(json_output_dir);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), records = archive.records.len(), "Wrote JSON archive");
    Ok(path)
}
