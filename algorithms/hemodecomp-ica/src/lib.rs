//! # Independent Component Analysis (ICA)
//!
//! `hemodecomp-ica` provides the ICA side of the hemodecomp comparison.
//!
//! ICA separates mutivariate signals into their additive, independent subcomponents. Applied to
//! fNIRS recordings it recovers sources such as the task response, cardiac and respiratory
//! oscillations or motion artefacts as separate time courses.
//!
//! Input data is whitened (remove underlying correlation) before modeling.
//!
//! ## Current state
//!
//! `hemodecomp-ica` currently provides an implementation of the following methods:
//!
//! - Fast Independent Component Analysis (Fast ICA), parallel variant with symmetric
//!   decorrelation

pub mod error;
pub mod fast_ica;
pub mod hyperparams;

pub use error::{FastIcaError, Result};
pub use fast_ica::{FastIca, GFunc};
pub use hyperparams::{FastIcaParams, FastIcaValidParams};
