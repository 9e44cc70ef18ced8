//! Error types in hemodecomp
//!

use std::fmt;

use thiserror::Error;

use crate::subject::SubjectId;

pub type Result<T> = std::result::Result<T, Error>;

/// The signal whose variance vanished while computing a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroVariance {
    /// Component at this (zero based) column of the time course matrix
    Component(usize),
    /// The task regressor itself, i.e. no task block overlaps the recording or the task never
    /// switches off
    Regressor,
}

impl fmt::Display for ZeroVariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroVariance::Component(idx) => write!(f, "component {}", idx),
            ZeroVariance::Regressor => write!(f, "the task regressor"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown subject {subject}, valid subjects are {valid:?}")]
    UnknownSubject {
        subject: SubjectId,
        valid: Vec<SubjectId>,
    },
    #[error("invalid chromophore {0:?}, expected \"hbo\" or \"hbr\"")]
    InvalidChromophore(String),
    #[error("invalid frequency band [{low}, {high}] Hz: {reason}")]
    InvalidBand { low: f64, high: f64, reason: String },
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error(
        "algorithm not converged after {iterations} iterations (last update {last_update:.3e}, tolerance {tol:.3e})"
    )]
    NotConverged {
        iterations: usize,
        last_update: f64,
        tol: f64,
    },
    #[error("{ncomponents} components requested from {nsamples} samples x {nchannels} channels")]
    Dimension {
        ncomponents: usize,
        nsamples: usize,
        nchannels: usize,
    },
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),
    #[error("length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("correlation with the task regressor is undefined: {0} has zero variance")]
    UndefinedCorrelation(ZeroVariance),
    #[cfg(feature = "blas")]
    #[error(transparent)]
    LinalgBlas(#[from] ndarray_linalg::error::LinalgError),
    #[error(transparent)]
    Linalg(#[from] linfa_linalg::LinalgError),
}

impl Error {
    /// Stable name of the error kind, used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownSubject { .. } => "UnknownSubjectError",
            Error::InvalidChromophore(_) => "InvalidChromophoreError",
            Error::InvalidBand { .. } => "InvalidBandError",
            Error::Parameters(_) => "ParameterError",
            Error::NotConverged { .. } => "ConvergenceError",
            Error::Dimension { .. } => "DimensionError",
            Error::DegenerateSignal(_) => "DegenerateSignalError",
            Error::LengthMismatch { .. } => "LengthMismatchError",
            Error::UndefinedCorrelation(_) => "UndefinedCorrelationError",
            #[cfg(feature = "blas")]
            Error::LinalgBlas(_) => "LinalgError",
            Error::Linalg(_) => "LinalgError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let err = Error::Dimension {
            ncomponents: 10,
            nsamples: 100,
            nchannels: 5,
        };
        assert_eq!(err.kind(), "DimensionError");
        assert_eq!(
            err.to_string(),
            "10 components requested from 100 samples x 5 channels"
        );

        let err = Error::UndefinedCorrelation(ZeroVariance::Component(4));
        assert_eq!(err.kind(), "UndefinedCorrelationError");
        assert!(err.to_string().contains("component 4"));
    }
}
