//! Uniform result of a linear decomposition
//!
//! PCA and ICA express their factorisations differently: PCA yields scores `Z` (T×K) and
//! loadings `W` (K×C) with `X̂ = Z·W + mean`, FastICA yields sources `S` (T×K) and a mixing matrix
//! `A` (C×K) with `X̂ = S·Aᵀ + mean`. At this boundary both are normalised to time courses (T×K)
//! and spatial weights (K×C), so that reconstruction is always `time_courses · weights + mean`.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::Float;

/// The two decomposition methods compared by the study
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "UPPERCASE")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    /// Principal Component Analysis
    Pca,
    /// Independent Component Analysis (FastICA)
    Ica,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Pca, Method::Ica];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Pca => "PCA",
            Method::Ica => "ICA",
        }
    }

    /// Prefix of the component labels, `PC` or `IC`
    pub fn component_prefix(&self) -> &'static str {
        match self {
            Method::Pca => "PC",
            Method::Ica => "IC",
        }
    }

    /// One based label of the component at zero based column `idx`, e.g. `PC3`
    pub fn component_label(&self, idx: usize) -> String {
        format!("{}{}", self.component_prefix(), idx + 1)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PCA" => Ok(Method::Pca),
            "ICA" => Ok(Method::Ica),
            _ => Err(Error::Parameters(format!(
                "unknown decomposition method {:?}, expected PCA or ICA",
                s
            ))),
        }
    }
}

/// What to do when an iterative method exhausts its iteration budget
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub enum ConvergencePolicy {
    /// Fail the fit with [`Error::NotConverged`]
    Strict,
    /// Log a warning and return the last iterate, flagged in [`FitDiagnostics::converged`]
    Warn,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        ConvergencePolicy::Warn
    }
}

/// Method specific information about a fit
#[derive(Debug, Clone, PartialEq)]
pub struct FitDiagnostics<F> {
    /// Iterations used by an iterative method, `None` for closed form methods
    pub n_iter: Option<usize>,
    /// Whether the iterative method reached its tolerance
    pub converged: bool,
    /// Fraction of the total variance explained by each component, PCA only
    pub explained_variance_ratio: Option<Array1<F>>,
}

impl<F> FitDiagnostics<F> {
    /// Diagnostics of a closed form fit
    pub fn closed_form(explained_variance_ratio: Option<Array1<F>>) -> Self {
        FitDiagnostics {
            n_iter: None,
            converged: true,
            explained_variance_ratio,
        }
    }

    /// Diagnostics of an iterative fit
    pub fn iterative(n_iter: usize, converged: bool) -> Self {
        FitDiagnostics {
            n_iter: Some(n_iter),
            converged,
            explained_variance_ratio: None,
        }
    }
}

/// Fitted components of one signal matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<F> {
    method: Method,
    time_courses: Array2<F>,
    spatial_weights: Array2<F>,
    mean: Array1<F>,
    diagnostics: FitDiagnostics<F>,
}

impl<F: Float> Decomposition<F> {
    /// Bundle a fit into the uniform shape
    ///
    /// * `time_courses`: T×K component time courses
    /// * `spatial_weights`: K×C weights such that `time_courses · spatial_weights + mean`
    ///   reconstructs the records
    /// * `mean`: per channel offset removed before fitting
    pub fn new(
        method: Method,
        time_courses: Array2<F>,
        spatial_weights: Array2<F>,
        mean: Array1<F>,
        diagnostics: FitDiagnostics<F>,
    ) -> Result<Self> {
        if time_courses.ncols() != spatial_weights.nrows() {
            return Err(Error::LengthMismatch {
                context: "component count of time courses and spatial weights",
                expected: time_courses.ncols(),
                actual: spatial_weights.nrows(),
            });
        }
        if spatial_weights.ncols() != mean.len() {
            return Err(Error::LengthMismatch {
                context: "channel count of spatial weights and mean",
                expected: spatial_weights.ncols(),
                actual: mean.len(),
            });
        }

        Ok(Decomposition {
            method,
            time_courses,
            spatial_weights,
            mean,
            diagnostics,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Component time courses, T×K
    pub fn time_courses(&self) -> ArrayView2<F> {
        self.time_courses.view()
    }

    /// Spatial weights, K×C
    pub fn spatial_weights(&self) -> ArrayView2<F> {
        self.spatial_weights.view()
    }

    /// Per channel mean removed before fitting
    pub fn mean(&self) -> ArrayView1<F> {
        self.mean.view()
    }

    pub fn diagnostics(&self) -> &FitDiagnostics<F> {
        &self.diagnostics
    }

    pub fn nsamples(&self) -> usize {
        self.time_courses.nrows()
    }

    pub fn ncomponents(&self) -> usize {
        self.time_courses.ncols()
    }

    pub fn nchannels(&self) -> usize {
        self.spatial_weights.ncols()
    }

    /// Label of the component at zero based column `idx`
    pub fn component_label(&self, idx: usize) -> String {
        self.method.component_label(idx)
    }

    /// Map the components back into channel space, T×C
    pub fn reconstruct(&self) -> Array2<F> {
        self.time_courses.dot(&self.spatial_weights) + &self.mean.view().insert_axis(Axis(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn labels_are_one_based() {
        assert_eq!(Method::Pca.component_label(2), "PC3");
        assert_eq!(Method::Ica.component_label(6), "IC7");
        assert_eq!("ica".parse::<Method>().unwrap(), Method::Ica);
        assert!("nmf".parse::<Method>().is_err());
    }

    #[test]
    fn reconstruct_adds_mean() {
        let decomposition = Decomposition::new(
            Method::Pca,
            array![[1., 0.], [0., 1.], [1., 1.]],
            array![[1., 2., 0.], [0., 1., 3.]],
            array![10., 20., 30.],
            FitDiagnostics::closed_form(None),
        )
        .unwrap();

        assert_eq!(decomposition.nsamples(), 3);
        assert_eq!(decomposition.ncomponents(), 2);
        assert_eq!(decomposition.nchannels(), 3);
        assert_abs_diff_eq!(
            decomposition.reconstruct(),
            array![[11., 22., 30.], [10., 21., 33.], [11., 23., 33.]]
        );
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let res = Decomposition::new(
            Method::Ica,
            Array2::<f64>::zeros((4, 2)),
            Array2::zeros((3, 5)),
            Array1::zeros(5),
            FitDiagnostics::iterative(3, true),
        );
        assert!(matches!(res, Err(Error::LengthMismatch { .. })));
    }
}
