//! Errors of the batch study

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudyError>;

/// Everything that can abort a subject run or the whole batch
#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Analysis(#[from] hemodecomp::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {field} {message}")]
    Config {
        field: &'static str,
        message: String,
    },

    #[error("missing file {0}")]
    MissingFile(PathBuf),

    #[error("malformed recording {path}: {reason}")]
    MalformedRecording { path: PathBuf, reason: String },
}

impl StudyError {
    /// Stable name of the error kind, used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analysis(e) => e.kind(),
            Self::Io { .. } => "IoError",
            Self::Csv { .. } => "CsvError",
            Self::Toml { .. } | Self::Config { .. } => "ConfigError",
            Self::MissingFile(_) => "MissingFileError",
            Self::MalformedRecording { .. } => "MalformedRecordingError",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StudyError {
        let path = path.into();
        move |source| StudyError::Io { path, source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> StudyError {
        let path = path.into();
        move |source| StudyError::Csv { path, source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> StudyError {
        StudyError::MalformedRecording {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_pass_through_analysis_errors() {
        let err = StudyError::from(hemodecomp::Error::UnknownSubject {
            subject: 1,
            valid: vec![356],
        });
        assert_eq!(err.kind(), "UnknownSubjectError");
        assert_eq!(StudyError::MissingFile("x.tsv".into()).kind(), "MissingFileError");
    }
}
