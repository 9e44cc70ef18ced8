//! Append-only per-subject metrics
//!
//! Every completed subject run becomes one [`MetricsRow`] in a CSV file with a fixed header. Rows
//! are appended as soon as a run finishes, so an interrupted batch keeps everything it has done so
//! far. The header is written only when the file is absent or empty.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use hemodecomp::{Chromophore, Method, SubjectId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::pipeline::SubjectRunResult;

/// Column names of the metrics file, in order
pub const METRICS_HEADER: [&str; 7] = [
    "subject",
    "chrom",
    "method",
    "recon_error",
    "best_abs_corr",
    "best_component",
    "best_corr",
];

/// Persisted projection of a [`SubjectRunResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub subject: SubjectId,
    pub chrom: Chromophore,
    pub method: Method,
    pub recon_error: f64,
    pub best_abs_corr: f64,
    /// One based label of the best component, e.g. `IC3`
    pub best_component: String,
    pub best_corr: f64,
}

impl From<&SubjectRunResult> for MetricsRow {
    fn from(result: &SubjectRunResult) -> Self {
        MetricsRow {
            subject: result.subject,
            chrom: result.chromophore,
            method: result.method,
            recon_error: result.recon_error,
            best_abs_corr: result.best_abs_corr,
            best_component: result.best_component_label(),
            best_corr: result.best_corr,
        }
    }
}

/// CSV file the metrics rows are appended to
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsStore {
    path: PathBuf,
}

impl MetricsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MetricsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, creating the file, its parent directories and the header if needed
    pub fn append(&self, row: &MetricsRow) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(StudyError::io(parent))?;
        }

        let write_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(StudyError::io(&self.path))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            writer
                .write_record(METRICS_HEADER)
                .map_err(StudyError::csv(&self.path))?;
        }
        writer.serialize(row).map_err(StudyError::csv(&self.path))?;
        writer.flush().map_err(StudyError::io(&self.path))?;

        Ok(())
    }

    /// Every row written so far, empty if the file does not exist yet
    pub fn read_all(&self) -> Result<Vec<MetricsRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(StudyError::csv(&self.path))?;

        reader
            .deserialize()
            .map(|row| row.map_err(StudyError::csv(&self.path)))
            .collect()
    }
}
