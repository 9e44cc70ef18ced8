//! # Principal Component Analysis
//!
//! `hemodecomp-reduction` provides the PCA side of the hemodecomp comparison. It projects a
//! z-scored T×C hemoglobin matrix onto the K directions of largest variance and exposes the
//! result through the [`Decomposer`](hemodecomp::traits::Decomposer) capability shared with
//! FastICA.

mod error;
mod pca;

pub use error::{ReductionError, Result};
pub use pca::{Pca, PcaParams, PcaValidParams};
