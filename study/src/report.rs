//! Comparison of the two methods across the cohort
//!
//! Works on whatever rows the metrics store holds: any subset of (chromophore, method)
//! combinations and duplicated runs are accepted.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hemodecomp::{Chromophore, Method, SubjectId};

use crate::error::{Result, StudyError};
use crate::metrics::MetricsRow;

/// Mean metrics of one (chromophore, method) combination
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub chrom: Chromophore,
    pub method: Method,
    /// Number of rows averaged
    pub count: usize,
    pub recon_error: f64,
    pub best_abs_corr: f64,
}

type GroupKey = (&'static str, &'static str);

fn group_key(chrom: Chromophore, method: Method) -> GroupKey {
    (chrom.as_str(), method.as_str())
}

/// Mean reconstruction error and best |corr| by (chromophore, method)
///
/// Groups are sorted by the chromophore name, then by the method name.
pub fn group_means(rows: &[MetricsRow]) -> Vec<GroupMean> {
    let mut groups: BTreeMap<GroupKey, GroupMean> = BTreeMap::new();

    for row in rows {
        let entry = groups
            .entry(group_key(row.chrom, row.method))
            .or_insert_with(|| GroupMean {
                chrom: row.chrom,
                method: row.method,
                count: 0,
                recon_error: 0.,
                best_abs_corr: 0.,
            });
        entry.count += 1;
        entry.recon_error += row.recon_error;
        entry.best_abs_corr += row.best_abs_corr;
    }

    groups
        .into_values()
        .map(|mut group| {
            let n = group.count as f64;
            group.recon_error /= n;
            group.best_abs_corr /= n;
            group
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    recon_error: f64,
    best_abs_corr: f64,
}

/// One row per subject with a column pair per (chromophore, method)
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    combinations: Vec<(Chromophore, Method)>,
    subjects: BTreeMap<SubjectId, BTreeMap<GroupKey, Cell>>,
}

impl WideTable {
    /// Pivot the metrics rows, later rows replace earlier ones of the same subject and combination
    pub fn pivot(rows: &[MetricsRow]) -> Self {
        let mut combinations = BTreeMap::new();
        let mut subjects: BTreeMap<SubjectId, BTreeMap<GroupKey, Cell>> = BTreeMap::new();

        for row in rows {
            let key = group_key(row.chrom, row.method);
            combinations.insert(key, (row.chrom, row.method));
            subjects.entry(row.subject).or_default().insert(
                key,
                Cell {
                    recon_error: row.recon_error,
                    best_abs_corr: row.best_abs_corr,
                },
            );
        }

        WideTable {
            combinations: combinations.into_values().collect(),
            subjects,
        }
    }

    /// Present (chromophore, method) combinations in column order
    pub fn combinations(&self) -> &[(Chromophore, Method)] {
        &self.combinations
    }

    pub fn subjects(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.subjects.keys().copied()
    }

    /// Reconstruction error and best |corr| of a subject, if that run is present
    pub fn get(
        &self,
        subject: SubjectId,
        chrom: Chromophore,
        method: Method,
    ) -> Option<(f64, f64)> {
        self.subjects
            .get(&subject)?
            .get(&group_key(chrom, method))
            .map(|cell| (cell.recon_error, cell.best_abs_corr))
    }

    /// Header of the CSV form: `subject`, then all `recon_error_<chrom>_<METHOD>` columns, then all
    /// `best_abs_corr_<chrom>_<METHOD>` columns
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["subject".to_string()];
        for value in ["recon_error", "best_abs_corr"] {
            header.extend(
                self.combinations
                    .iter()
                    .map(|(chrom, method)| format!("{}_{}_{}", value, chrom, method)),
            );
        }
        header
    }

    /// Write the table, missing combinations are left empty
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(StudyError::io(parent))?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(StudyError::csv(path))?;
        writer
            .write_record(self.header())
            .map_err(StudyError::csv(path))?;

        let format = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        for (subject, cells) in &self.subjects {
            let lookup = |(chrom, method): &(Chromophore, Method)| {
                cells.get(&group_key(*chrom, *method)).copied()
            };

            let mut record = vec![subject.to_string()];
            record.extend(
                self.combinations
                    .iter()
                    .map(|c| format(lookup(c).map(|cell| cell.recon_error))),
            );
            record.extend(
                self.combinations
                    .iter()
                    .map(|c| format(lookup(c).map(|cell| cell.best_abs_corr))),
            );
            writer.write_record(&record).map_err(StudyError::csv(path))?;
        }
        writer.flush().map_err(StudyError::io(path))?;

        Ok(())
    }
}
