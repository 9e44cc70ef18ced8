//! Finger tapping study comparing PCA and ICA
//!
//! Runs both decomposition methods on the HbO and HbR channels of every subject of the cohort,
//! scores how well the best component follows the tapping blocks and collects the results:
//!
//! * [`recording`] reads BIDS-like TSV exports of the recordings
//! * [`loader`] validates the subject and prepares the signal
//! * [`pipeline`] runs the batch and isolates failing subjects
//! * [`metrics`] appends one row per completed run to a CSV file
//! * [`report`] aggregates the rows into group means and a wide per-subject table
//!
//! ```no_run
//! use hemodecomp_study::{run_study, StudyConfig};
//!
//! let config = StudyConfig::from_toml_file("study.toml")?;
//! let summary = run_study(&config)?;
//! println!("{} runs completed", summary.completed.len());
//! # Ok::<(), hemodecomp_study::StudyError>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod recording;
pub mod report;

pub use config::{IcaConfig, StudyConfig};
pub use error::{Result, StudyError};
pub use loader::load_hemoglobin_data;
pub use metrics::{MetricsRow, MetricsStore, METRICS_HEADER};
pub use pipeline::{run_batch, run_study, run_subject, BatchSummary, SubjectFailure, SubjectRunResult};
pub use recording::{BidsTsvSource, Recording, RecordingSource};
