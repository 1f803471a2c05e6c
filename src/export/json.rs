use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::accounting::SamplesHistory;
use crate::compensation::CompensationRecord;

/// Everything recorded about past accounting periods and compensations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub samples: SamplesHistory,
    pub compensations: Vec<CompensationRecord>,
}

impl Report {
    pub fn new(samples: SamplesHistory, compensations: Vec<CompensationRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            samples,
            compensations,
        }
    }
}

/// Export report to JSON
pub fn export_json<W: Write>(report: &Report, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Export report to JSON string
pub fn export_json_string(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Export report into `dir` with auto-generated name
pub fn export_json_file(report: &Report, dir: &Path) -> Result<PathBuf> {
    let timestamp = report.generated_at.format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("dtm-{}.json", timestamp));

    let file = std::fs::File::create(&path)?;
    export_json(report, file)?;

    Ok(path)
}
