//! Principal Component Analysis
//!
//! Principal Component Analysis is a common technique for data and dimensionality reduction. It
//! reduces the dimensionality of the data while retaining most of the variance. This is
//! done by projecting the data to a lower dimensional space with the eigendecomposition of the
//! channel covariance. The first principal component is the direction of largest variance,
//! the second the direction of largest remaining variance orthogonal to the first, and so on.
//!
//! # Example
//!
//! ```
//! use hemodecomp::traits::{Fit, Transformer};
//! use hemodecomp_reduction::{Pca, ReductionError};
//! use ndarray::array;
//!
//! let records = array![[1., 2.], [2., 4.1], [3., 5.9], [4., 8.]];
//!
//! let pca: Pca<f64> = Fit::<_, ReductionError>::fit(&Pca::params(1), &records).unwrap();
//! let scores = pca.transform(&records);
//! assert_eq!(scores.dim(), (4, 1));
//! ```
//!
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use hemodecomp::{
    decomposition::{Decomposition, FitDiagnostics, Method},
    linalg::eigh_descending,
    param_guard::ParamGuard,
    traits::{Decomposer, Fit, Transformer},
    Float,
};

use crate::error::{ReductionError, Result};

/// Validated PCA hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcaValidParams {
    ncomponents: usize,
}

impl PcaValidParams {
    pub fn ncomponents(&self) -> usize {
        self.ncomponents
    }
}

/// PCA hyperparameters
///
/// The only parameter is the number of components K, which must be positive.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcaParams(PcaValidParams);

impl PcaParams {
    pub fn new(ncomponents: usize) -> Self {
        PcaParams(PcaValidParams { ncomponents })
    }

    /// Set the number of components
    pub fn ncomponents(mut self, ncomponents: usize) -> Self {
        self.0.ncomponents = ncomponents;
        self
    }
}

impl ParamGuard for PcaParams {
    type Checked = PcaValidParams;
    type Error = ReductionError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.ncomponents == 0 {
            Err(ReductionError::NoComponents)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ReductionError> for PcaValidParams {
    type Object = Pca<F>;

    /// Fit the principal components of `records` (samples × channels)
    ///
    /// # Errors
    ///
    /// * no samples
    /// * more components than `min(samples, channels)`
    /// * non-finite records
    fn fit(&self, records: &ArrayBase<D, Ix2>) -> Result<Pca<F>> {
        let (nsamples, nfeatures) = records.dim();
        if nsamples == 0 {
            return Err(ReductionError::NotEnoughSamples);
        }
        if self.ncomponents > nsamples.min(nfeatures) {
            return Err(ReductionError::TooManyComponents {
                ncomponents: self.ncomponents,
                nsamples,
                nfeatures,
            });
        }
        if records.iter().any(|x| !x.is_finite()) {
            return Err(ReductionError::NonFinite);
        }

        // calculate mean of data and subtract it
        // safe unwrap because we already returned an error on zero samples
        let mean = records.mean_axis(Axis(0)).unwrap();
        let centered = records - &mean.view().insert_axis(Axis(0));

        // sample covariance, a single sample has none
        let dof = F::cast(nsamples.saturating_sub(1).max(1));
        let covariance = centered.t().dot(&centered) / dof;

        let (eig_val, eig_vec) = eigh_descending(&covariance)?;
        // round-off may push vanishing eigenvalues below zero
        let eig_val = eig_val.mapv(|x| x.max(F::zero()));
        let total_variance = eig_val.sum();

        let components = eig_vec.slice(s![.., ..self.ncomponents]).t().to_owned();
        let explained_variance = eig_val.slice_move(s![..self.ncomponents]);

        Ok(Pca {
            components,
            explained_variance,
            total_variance,
            mean,
        })
    }
}

/// Fitted principal components
///
/// The components are stored as rows of a K×C matrix, sorted by decreasing explained variance.
/// Each component is oriented such that its entry of largest magnitude is positive.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Pca<F> {
    components: Array2<F>,
    explained_variance: Array1<F>,
    total_variance: F,
    mean: Array1<F>,
}

impl Pca<f32> {
    /// Create default parameter set
    ///
    /// # Parameters
    ///
    ///  * `ncomponents`: the number of principal components to keep
    pub fn params(ncomponents: usize) -> PcaParams {
        PcaParams::new(ncomponents)
    }
}

impl<F: Float> Pca<F> {
    /// Principal axes in channel space, K×C
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Per channel mean removed before projecting
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Return the amount of explained variance per component
    pub fn explained_variance(&self) -> Array1<F> {
        self.explained_variance.clone()
    }

    /// Return the normalized amount of explained variance per component
    ///
    /// All zeros if the records had no variance at all.
    pub fn explained_variance_ratio(&self) -> Array1<F> {
        if self.total_variance > F::zero() {
            self.explained_variance.mapv(|x| x / self.total_variance)
        } else {
            Array1::zeros(self.explained_variance.len())
        }
    }

    /// Map component scores (T×K) back into channel space
    pub fn inverse_transform<D: Data<Elem = F>>(&self, scores: &ArrayBase<D, Ix2>) -> Array2<F> {
        scores.dot(&self.components) + &self.mean.view().insert_axis(Axis(0))
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Array2<F>> for Pca<F> {
    /// Project records (T×C) onto the principal components, T×K scores
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        (x - &self.mean.view().insert_axis(Axis(0))).dot(&self.components.t())
    }
}

impl<F: Float> Decomposer<F> for PcaParams {
    fn method(&self) -> Method {
        Method::Pca
    }

    fn ncomponents(&self) -> usize {
        self.0.ncomponents
    }

    fn decompose(&self, records: &Array2<F>) -> hemodecomp::Result<Decomposition<F>> {
        let pca: Pca<F> = Fit::<_, ReductionError>::fit(self, records)?;
        let scores = pca.transform(records);
        let diagnostics = FitDiagnostics::closed_form(Some(pca.explained_variance_ratio()));

        Decomposition::new(Method::Pca, scores, pca.components, pca.mean, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hemodecomp::{
        error::{Error, ZeroVariance},
        reconstruction::relative_error,
        scoring::score_components,
    };
    use ndarray::{array, Array};
    use ndarray_rand::{
        rand::{Rng, SeedableRng},
        rand_distr::Uniform,
        RandomExt,
    };
    use rand_xoshiro::Xoshiro256Plus;

    fn random_records(nsamples: usize, nchannels: usize, seed: u64) -> Array2<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let latent = Array::random_using((nsamples, 3), Uniform::new(-1., 1.), &mut rng);
        let mixing = Array::random_using((3, nchannels), Uniform::new(-2., 2.), &mut rng);
        latent.dot(&mixing)
            + Array::random_using((nsamples, nchannels), Uniform::new(-0.1, 0.1), &mut rng)
    }

    fn block_regressor(nsamples: usize) -> Array1<f64> {
        Array1::from_shape_fn(nsamples, |i| if (i / 15) % 2 == 1 { 1. } else { 0. })
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Pca<f64>>();
        has_autotraits::<PcaParams>();
        has_autotraits::<PcaValidParams>();
        has_autotraits::<ReductionError>();
    }

    #[test]
    fn single_direction_of_variance() {
        // all samples on the line through (1, 2)
        let records = Array2::from_shape_fn((50, 2), |(t, c)| t as f64 * (c + 1) as f64);
        let pca: Pca<f64> = Fit::<_, ReductionError>::fit(&Pca::params(2), &records).unwrap();

        let ratio = pca.explained_variance_ratio();
        assert_abs_diff_eq!(ratio[0], 1., epsilon = 1e-10);
        assert_abs_diff_eq!(ratio[1], 0., epsilon = 1e-10);

        let direction = array![1., 2.] / 5f64.sqrt();
        assert_abs_diff_eq!(pca.components().row(0), direction, epsilon = 1e-10);
    }

    #[test]
    fn full_rank_reconstruction_is_exact() {
        let records = random_records(200, 6, 3);
        let decomposition = PcaParams::new(6).decompose(&records).unwrap();

        let error = relative_error(&records, &decomposition.reconstruct()).unwrap();
        assert_abs_diff_eq!(error, 0., epsilon = 1e-6);

        let ratio = decomposition
            .diagnostics()
            .explained_variance_ratio
            .clone()
            .unwrap();
        assert_abs_diff_eq!(ratio.sum(), 1., epsilon = 1e-10);
    }

    #[test]
    fn truncated_fit_is_ordered() {
        let records = random_records(300, 8, 11);
        let pca: Pca<f64> = Fit::<_, ReductionError>::fit(&Pca::params(4), &records).unwrap();

        let variance = pca.explained_variance();
        assert!(variance.windows(2).into_iter().all(|w| w[0] >= w[1]));
        assert!(pca.explained_variance_ratio().sum() <= 1. + 1e-12);

        // orthonormal rows
        let gram = pca.components().dot(&pca.components().t());
        assert_abs_diff_eq!(gram, Array2::eye(4), epsilon = 1e-10);

        // score variance equals the explained variance
        let scores = pca.transform(&records);
        for (column, var) in scores.axis_iter(Axis(1)).zip(variance.iter()) {
            assert_abs_diff_eq!(column.var(1.), *var, epsilon = 1e-9);
        }

        // three latent sources, so four components keep almost everything
        let error = relative_error(&records, &pca.inverse_transform(&scores)).unwrap();
        assert!(error < 0.1);
    }

    #[test]
    fn component_signs_are_deterministic() {
        let records = random_records(100, 5, 7);
        let flipped = records.mapv(|x| -x);

        let a = PcaParams::new(3).decompose(&records).unwrap();
        let b = PcaParams::new(3).decompose(&flipped).unwrap();

        assert_abs_diff_eq!(a.spatial_weights(), b.spatial_weights(), epsilon = 1e-8);
        for row in a.spatial_weights().outer_iter() {
            let pivot = row.iter().fold(0f64, |acc, &x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.);
        }
    }

    #[test]
    fn invalid_component_counts() {
        let records = random_records(20, 4, 0);

        assert!(matches!(
            PcaParams::new(0).decompose(&records),
            Err(Error::Parameters(_))
        ));
        assert!(matches!(
            PcaParams::new(5).decompose(&records),
            Err(Error::Dimension {
                ncomponents: 5,
                nsamples: 20,
                nchannels: 4
            })
        ));
        let few_samples = random_records(3, 4, 0);
        assert!(matches!(
            PcaParams::new(4).decompose(&few_samples),
            Err(Error::Dimension { .. })
        ));
    }

    #[test]
    fn constant_channel_gives_an_undefined_component() {
        let mut records = random_records(120, 5, 5);
        records.column_mut(2).fill(2.);

        let decomposition = PcaParams::new(5).decompose(&records).unwrap();
        let regressor = block_regressor(120);

        assert!(matches!(
            score_components(&decomposition.time_courses(), &regressor),
            Err(Error::UndefinedCorrelation(ZeroVariance::Component(4)))
        ));
    }

    #[test]
    fn task_channel_is_the_first_component() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let regressor = block_regressor(150);
        let mut records = Array2::from_shape_fn((150, 6), |_| rng.gen_range(-0.1..0.1));
        records.column_mut(0).scaled_add(10., &regressor);

        let decomposition = PcaParams::new(4).decompose(&records).unwrap();
        let scores = score_components(&decomposition.time_courses(), &regressor).unwrap();
        let (idx, _, abs_corr) = scores.best();

        assert_eq!(decomposition.component_label(idx), "PC1");
        assert!(abs_corr > 0.95);
    }

    #[test]
    fn scaled_task_channel_is_the_first_component() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let regressor = block_regressor(100);
        let mut records = Array2::from_shape_fn((100, 5), |_| rng.gen_range(-0.5..0.5));
        records.column_mut(0).assign(&regressor.mapv(|r| 3. * r));

        let decomposer: &dyn Decomposer<f64> = &PcaParams::new(5);
        let decomposition = decomposer.decompose(&records).unwrap();
        let scores = score_components(&decomposition.time_courses(), &regressor).unwrap();
        let (idx, corr, abs_corr) = scores.best();

        assert_eq!(idx, 0);
        assert_eq!(decomposition.component_label(idx), "PC1");
        assert!(abs_corr > 0.95, "{}", abs_corr);
        assert_eq!(abs_corr, corr.abs());
    }
}
