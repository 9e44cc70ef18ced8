//! Provide traits for the different decomposition methods
//!
use ndarray::Array2;

use crate::decomposition::{Decomposition, Method};
use crate::error::{Error, Result};
use crate::Float;

/// Fittable algorithms
///
/// A fittable algorithm takes a record matrix and creates a model from it. The model holds
/// everything needed to project records onto its components afterwards.
pub trait Fit<R, E: std::error::Error + From<Error>> {
    type Object;

    fn fit(&self, records: &R) -> std::result::Result<Self::Object, E>;
}

/// Transformation algorithms
///
/// A transformer takes records and maps them onto another representation, for example the
/// component time courses of a fitted model.
pub trait Transformer<R, T> {
    fn transform(&self, x: R) -> T;
}

/// Linear decomposition of a T×C signal matrix into K components
///
/// Both implementations (PCA and FastICA) produce the same [`Decomposition`] shape, so the
/// scoring and reconstruction steps never need to know which method ran. Errors of the concrete
/// algorithm are translated into the crate-level taxonomy at this boundary.
pub trait Decomposer<F: Float> {
    /// Which method this decomposer runs
    fn method(&self) -> Method;

    /// Number of components K the decomposition will produce
    fn ncomponents(&self) -> usize;

    /// Fit the method on `records` (samples × channels) and return the fitted components
    fn decompose(&self, records: &Array2<F>) -> Result<Decomposition<F>>;
}

impl<F: Float, D: Decomposer<F> + ?Sized> Decomposer<F> for Box<D> {
    fn method(&self) -> Method {
        (**self).method()
    }

    fn ncomponents(&self) -> usize {
        (**self).ncomponents()
    }

    fn decompose(&self, records: &Array2<F>) -> Result<Decomposition<F>> {
        (**self).decompose(records)
    }
}
