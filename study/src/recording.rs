//! Hemoglobin recordings on disk
//!
//! A subject's recording is read through the [`RecordingSource`] boundary. The file based
//! implementation, [`BidsTsvSource`], expects hemoglobin concentrations exported to tab separated
//! files in a BIDS-like tree:
//!
//! ```text
//! <root>/sub-<id>/ses-1/nirs/sub-<id>_ses-1_task-FingerTapping_run-01_hb.tsv
//! <root>/sub-<id>/ses-1/nirs/sub-<id>_ses-1_task-FingerTapping_run-01_events.tsv
//! ```
//!
//! The `_hb.tsv` file has a `time` column followed by one column per channel, named like
//! `S1_D1 hbo` or `S1_D1 hbr`. The `_events.tsv` file has `onset` and `duration` columns and an
//! optional `trial_type`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use hemodecomp::signal::{self, regressor::on_fraction, Event, PreparedSignal};
use hemodecomp::{Chromophore, FrequencyBand, SubjectId};
use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::error::{Result, StudyError};

/// Raw channels of one chromophore together with the task events
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub subject: SubjectId,
    pub chromophore: Chromophore,
    /// Sample times in seconds, strictly increasing
    pub times: Array1<f64>,
    /// Raw concentrations, samples × channels
    pub data: Array2<f64>,
    pub channel_names: Vec<String>,
    /// Task blocks sorted by onset
    pub events: Vec<Event>,
}

/// Summary of the task design of a recording
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub nblocks: usize,
    /// Fraction of samples during which the task is on
    pub on_fraction: f64,
    /// End of the last block in seconds
    pub last_offset: f64,
}

impl Recording {
    pub fn nsamples(&self) -> usize {
        self.data.nrows()
    }

    pub fn nchannels(&self) -> usize {
        self.data.ncols()
    }

    pub fn sampling_rate(&self) -> hemodecomp::Result<f64> {
        signal::sampling_rate(&self.times)
    }

    /// Band-pass, normalise and build the task regressor
    pub fn prepare(self, band: Option<&FrequencyBand>) -> hemodecomp::Result<PreparedSignal> {
        signal::prepare(self.data, self.times, self.channel_names, &self.events, band)
    }

    pub fn task_summary(&self) -> hemodecomp::Result<TaskSummary> {
        let regressor = signal::boxcar(&self.times, &self.events)?;
        let last_offset = self
            .events
            .iter()
            .map(Event::end)
            .fold(0., f64::max);

        Ok(TaskSummary {
            nblocks: self.events.len(),
            on_fraction: on_fraction(&regressor),
            last_offset,
        })
    }
}

/// Somewhere recordings can be loaded from
pub trait RecordingSource {
    /// Load the channels of `chromophore` and the task events of `subject`
    fn load(&self, subject: SubjectId, chromophore: Chromophore) -> Result<Recording>;
}

impl<S: RecordingSource + ?Sized> RecordingSource for &S {
    fn load(&self, subject: SubjectId, chromophore: Chromophore) -> Result<Recording> {
        (**self).load(subject, chromophore)
    }
}

/// Recordings exported to TSV files in a BIDS-like directory tree
#[derive(Debug, Clone, PartialEq)]
pub struct BidsTsvSource {
    root: PathBuf,
    task: String,
    session: String,
    run: String,
}

impl BidsTsvSource {
    /// Finger tapping recordings of session 1, run 01 below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BidsTsvSource {
            root: root.into(),
            task: "FingerTapping".to_string(),
            session: "1".to_string(),
            run: "01".to_string(),
        }
    }

    fn file_path(&self, subject: SubjectId, suffix: &str) -> PathBuf {
        self.root
            .join(format!("sub-{}", subject))
            .join(format!("ses-{}", self.session))
            .join("nirs")
            .join(format!(
                "sub-{}_ses-{}_task-{}_run-{}_{}.tsv",
                subject, self.session, self.task, self.run, suffix
            ))
    }

    /// Path of the exported hemoglobin concentrations
    pub fn hemoglobin_path(&self, subject: SubjectId) -> PathBuf {
        self.file_path(subject, "hb")
    }

    /// Path of the event table
    pub fn events_path(&self, subject: SubjectId) -> PathBuf {
        self.file_path(subject, "events")
    }
}

impl RecordingSource for BidsTsvSource {
    fn load(&self, subject: SubjectId, chromophore: Chromophore) -> Result<Recording> {
        let (times, data, channel_names) =
            read_hemoglobin(&self.hemoglobin_path(subject), chromophore)?;
        let events = read_events(&self.events_path(subject))?;

        Ok(Recording {
            subject,
            chromophore,
            times,
            data,
            channel_names,
            events,
        })
    }
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.is_file() {
        return Err(StudyError::MissingFile(path.to_path_buf()));
    }

    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .map_err(StudyError::csv(path))
}

/// Read the time column and the channels of `chromophore`
pub fn read_hemoglobin(
    path: &Path,
    chromophore: Chromophore,
) -> Result<(Array1<f64>, Array2<f64>, Vec<String>)> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers().map_err(StudyError::csv(path))?.clone();

    match headers.get(0) {
        Some(first) if first.trim().eq_ignore_ascii_case("time") => {}
        _ => {
            return Err(StudyError::malformed(
                path,
                "first column must be `time`",
            ))
        }
    }

    let (columns, channel_names): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| chromophore.matches_channel(name.trim()))
        .map(|(idx, name)| (idx, name.trim().to_string()))
        .unzip();
    if columns.is_empty() {
        return Err(StudyError::malformed(
            path,
            format!("no {} channels", chromophore),
        ));
    }

    let parse = |row: usize, col: usize, field: &str| {
        field.trim().parse::<f64>().map_err(|_| {
            StudyError::malformed(
                path,
                format!("row {} column {}: cannot parse {:?} as a number", row + 1, col + 1, field),
            )
        })
    };

    let mut times = Vec::new();
    let mut data = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(StudyError::csv(path))?;
        times.push(parse(row, 0, record.get(0).unwrap_or(""))?);
        for &col in &columns {
            data.push(parse(row, col, record.get(col).unwrap_or(""))?);
        }
    }

    if times.len() < 2 {
        return Err(StudyError::malformed(
            path,
            format!("at least 2 samples needed, got {}", times.len()),
        ));
    }
    if times.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(StudyError::malformed(path, "time column is not strictly increasing"));
    }

    let data = Array2::from_shape_vec((times.len(), columns.len()), data)
        .map_err(|e| StudyError::malformed(path, e.to_string()))?;

    Ok((Array1::from(times), data, channel_names))
}

#[derive(Debug, Deserialize)]
struct EventRow {
    onset: f64,
    duration: f64,
    #[serde(default)]
    trial_type: Option<String>,
}

/// Read the event table, sorted by onset
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let mut reader = tsv_reader(path)?;

    let mut events = reader
        .deserialize::<EventRow>()
        .map(|row| {
            let row = row.map_err(StudyError::csv(path))?;
            let event = Event::new(row.onset, row.duration);
            Ok(match row.trial_type {
                Some(trial_type) => event.with_trial_type(trial_type),
                None => event,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    events.sort_by(|a, b| a.onset.partial_cmp(&b.onset).unwrap_or(Ordering::Equal));

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn bids_layout() {
        let source = BidsTsvSource::new("/data");
        assert_eq!(
            source.hemoglobin_path(356),
            PathBuf::from("/data/sub-356/ses-1/nirs/sub-356_ses-1_task-FingerTapping_run-01_hb.tsv")
        );
        assert_eq!(
            source.events_path(380),
            PathBuf::from(
                "/data/sub-380/ses-1/nirs/sub-380_ses-1_task-FingerTapping_run-01_events.tsv"
            )
        );
    }

    #[test]
    fn loads_the_requested_chromophore() {
        let dir = tempfile::tempdir().unwrap();
        let source = BidsTsvSource::new(dir.path());
        write(
            &source.hemoglobin_path(356),
            "time\tS1_D1 hbo\tS1_D1 hbr\tS2_D1 hbo\tS2_D1 hbr\n\
             0.0\t1.0\t-1.0\t2.0\t-2.0\n\
             0.5\t1.5\t-1.5\t2.5\t-2.5\n\
             1.0\t2.0\t-2.0\t3.0\t-3.0\n",
        );
        write(
            &source.events_path(356),
            "onset\tduration\ttrial_type\tvalue\n\
             0.5\t0.5\tTapping/Right\t2\n\
             0.0\t0.4\tTapping/Left\t1\n",
        );

        let recording = source.load(356, Chromophore::Hbr).unwrap();
        assert_eq!(recording.channel_names, vec!["S1_D1 hbr", "S2_D1 hbr"]);
        assert_eq!(recording.times, ndarray::array![0.0, 0.5, 1.0]);
        assert_eq!(
            recording.data,
            ndarray::array![[-1.0, -2.0], [-1.5, -2.5], [-2.0, -3.0]]
        );
        // sorted by onset
        assert_eq!(recording.events[0].onset, 0.0);
        assert_eq!(recording.events[1].trial_type.as_deref(), Some("Tapping/Right"));

        let summary = recording.task_summary().unwrap();
        assert_eq!(summary.nblocks, 2);
        // t = 0.0 and t = 0.5 are on
        assert!((summary.on_fraction - 2. / 3.).abs() < 1e-12);
        assert_eq!(summary.last_offset, 1.0);
        assert!((recording.sampling_rate().unwrap() - 2.).abs() < 1e-12);
    }

    #[test]
    fn missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = BidsTsvSource::new(dir.path());

        assert!(matches!(
            source.load(356, Chromophore::Hbo),
            Err(StudyError::MissingFile(_))
        ));

        write(&source.hemoglobin_path(356), "time\tS1_D1 hbr\n0\t1\n1\t2\n");
        write(&source.events_path(356), "onset\tduration\n0\t1\n");
        assert!(matches!(
            source.load(356, Chromophore::Hbo),
            Err(StudyError::MalformedRecording { .. })
        ));

        write(&source.hemoglobin_path(356), "time\tS1_D1 hbo\n0\t1\n0\t2\n");
        assert!(matches!(
            source.load(356, Chromophore::Hbo),
            Err(StudyError::MalformedRecording { .. })
        ));

        write(&source.hemoglobin_path(356), "time\tS1_D1 hbo\n0\t1\n1\tn/a\n");
        assert!(matches!(
            source.load(356, Chromophore::Hbo),
            Err(StudyError::MalformedRecording { .. })
        ));
    }
}
