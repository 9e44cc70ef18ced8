//! `hemodecomp` decomposes fNIRS hemoglobin recordings into latent components and scores how
//! well each component follows the timing of a block-design task.
//!
//! The crate holds the parts every decomposition method shares:
//!
//! * [`signal`] turns a filtered-or-raw channel matrix plus an event table into the prepared
//!   signal the decomposition methods consume: a per-channel z-scored matrix, its time vector and
//!   a boxcar task regressor.
//! * [`decomposition`] defines the uniform result shape ([`Decomposition`]) and the
//!   [`Decomposer`](traits::Decomposer) capability implemented by the PCA
//!   (`hemodecomp-reduction`) and FastICA (`hemodecomp-ica`) crates.
//! * [`scoring`] correlates every component time course with the task regressor and ranks them.
//! * [`reconstruction`] measures how much of the signal a decomposition keeps.
//!
//! The batch driver that loads subjects, runs both methods and persists one metrics row per run
//! lives in `hemodecomp-study`.

pub mod decomposition;
pub mod error;
pub mod linalg;
pub mod param_guard;
pub mod prelude;
pub mod reconstruction;
pub mod scoring;
pub mod signal;
pub mod subject;
pub mod traits;

pub use decomposition::{ConvergencePolicy, Decomposition, FitDiagnostics, Method};
pub use error::{Error, Result};
pub use param_guard::ParamGuard;
pub use subject::{Chromophore, Cohort, FrequencyBand, SubjectId};

use ndarray::NdFloat;
use num_traits::{FromPrimitive, NumCast};
use std::iter::Sum;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implements them for 32bit and 64bit floating points. Records, time courses and correlations
/// are all generic over it.
pub trait Float: NdFloat + FromPrimitive + Default + Sum {
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}
