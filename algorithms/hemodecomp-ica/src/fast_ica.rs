//! Fast algorithm for Independent Component Analysis (ICA)

use hemodecomp::{
    decomposition::{ConvergencePolicy, Decomposition, FitDiagnostics, Method},
    linalg::{eigh_descending, pinv_wide, rank_cutoff},
    traits::{Decomposer, Fit, Transformer},
    Float,
};
use ndarray::{s, Array, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{FastIcaError, Result};
use crate::hyperparams::{FastIcaParams, FastIcaValidParams};

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, FastIcaError> for FastIcaValidParams<F> {
    type Object = FastIca<F>;

    /// Fit the model
    ///
    /// # Errors
    ///
    /// If the [`FastIcaValidParams::ncomponents`] is set to a number greater than the minimum of
    /// the number of rows and columns
    ///
    /// If the iteration does not converge and the convergence policy is
    /// [`ConvergencePolicy::Strict`]
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (nsamples, nfeatures) = x.dim();
        if nsamples == 0 {
            return Err(FastIcaError::NotEnoughSamples);
        }

        // The number of components cannot be greater than the minimum of
        // the number of rows and columns
        let ncomponents = self.ncomponents();
        if ncomponents > nsamples.min(nfeatures) {
            return Err(FastIcaError::TooManyComponents {
                ncomponents,
                nsamples,
                nfeatures,
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FastIcaError::InvalidValue(
                "records contain non-finite values".to_string(),
            ));
        }

        // We center the input by subtracting the mean of its features
        // safe unwrap because we already returned an error on zero samples
        let xmean = x.mean_axis(Axis(0)).unwrap();
        let xcentered = x - &xmean.view().insert_axis(Axis(0));

        // We whiten the matrix to remove any potential correlation between
        // the components, only the directions with variance take part in the iteration
        let (k, rank) = whitening(&xcentered, ncomponents)?;
        if rank == 0 {
            return Err(hemodecomp::Error::DegenerateSignal(
                "records have no variance".to_string(),
            )
            .into());
        }
        let k_rank = k.slice(s![..rank, ..]);
        let mut xwhitened = k_rank.dot(&xcentered.t());

        // We multiply the matrix with root of the number of records
        let nsamples_sqrt = F::cast(nsamples).sqrt();
        xwhitened.mapv_inplace(|x| x * nsamples_sqrt);

        // We initialize the de-mixing matrix with a uniform distribution
        let mut rng = Xoshiro256Plus::seed_from_u64(self.random_state());
        let w: Array2<f64> = Array::random_using((rank, rank), Uniform::new(0., 1.), &mut rng);
        let w = w.mapv(F::cast);

        // We find the optimized de-mixing matrix
        let (w, n_iter, lim) = self.ica_parallel(&xwhitened, &w)?;
        let converged = lim < self.tol();
        if converged {
            tracing::debug!(n_iter, last_update = lim.to_f64(), "FastICA converged");
        } else {
            match self.convergence() {
                ConvergencePolicy::Strict => {
                    return Err(FastIcaError::NotConverged {
                        iterations: n_iter,
                        last_update: lim.to_f64().unwrap_or(f64::NAN),
                        tol: self.tol().to_f64().unwrap_or(f64::NAN),
                    })
                }
                ConvergencePolicy::Warn => tracing::warn!(
                    iterations = n_iter,
                    last_update = lim.to_f64(),
                    tol = self.tol().to_f64(),
                    "FastICA did not converge, keeping the last iterate"
                ),
            }
        }

        // We whiten the de-mixing matrix, components beyond the rank of the records stay zero
        let mut components = Array2::zeros((ncomponents, nfeatures));
        components
            .slice_mut(s![..rank, ..])
            .assign(&w.dot(&k_rank));

        // Rescale the sources to unit variance, components with a vanishing source are kept
        let sources = xcentered.dot(&components.t());
        let std = sources.std_axis(Axis(0), F::zero());
        let largest = std.iter().fold(F::zero(), |acc, &s| acc.max(s));
        for (mut row, &s) in components.outer_iter_mut().zip(std.iter()) {
            if s > largest * F::epsilon() {
                row.mapv_inplace(|v| v / s);
            }
        }

        let mixing = pinv_wide(&components)?;

        Ok(FastIca {
            mean: xmean,
            components,
            mixing,
            n_iter,
            converged,
        })
    }
}

/// Whitening matrix (ncomponents × nfeatures) of centered records and its rank
///
/// Rows are the leading eigenvectors of `Xᵀ X` scaled by the inverse root of their eigenvalue.
/// Directions without variance get a zero row instead; they come last since the eigenvalues are
/// sorted.
fn whitening<F: Float>(xcentered: &Array2<F>, ncomponents: usize) -> Result<(Array2<F>, usize)> {
    let gram = xcentered.t().dot(xcentered);
    let (eig_val, eig_vec) = eigh_descending(&gram)?;
    let cutoff = rank_cutoff(&eig_val, gram.nrows());

    let mut k = Array2::zeros((ncomponents, gram.nrows()));
    let mut rank = 0;
    for (i, mut row) in k.outer_iter_mut().enumerate() {
        if eig_val[i] > cutoff {
            let scale = eig_val[i].sqrt().recip();
            row.assign(&eig_vec.column(i).mapv(|v| v * scale));
            rank += 1;
        }
    }

    Ok((k, rank))
}

impl<F: Float> FastIcaValidParams<F> {
    // Parallel FastICA, Optimization step
    //
    // Returns the de-mixing matrix, the number of iterations run and the last update
    fn ica_parallel(&self, x: &Array2<F>, w: &Array2<F>) -> Result<(Array2<F>, usize, F)> {
        let mut w = Self::sym_decorrelation(w)?;

        let p = F::cast(x.ncols());
        let mut lim = F::infinity();
        let mut n_iter = 0;

        for _ in 0..self.max_iter() {
            n_iter += 1;
            let (gwtx, g_wtx) = self.gfunc().exec(&w.dot(x));

            let lhs = gwtx.dot(&x.t()).mapv(|x| x / p);
            let rhs = &w * &g_wtx.insert_axis(Axis(1));
            let wnew = Self::sym_decorrelation(&(lhs - rhs))?;

            // `lim` let us check for convergence between the old and
            // new weight values, we want their dot-product to almost equal one
            lim = *wnew
                .outer_iter()
                .zip(w.outer_iter())
                .map(|(a, b)| a.dot(&b))
                .collect::<Array1<F>>()
                .mapv(|x| (x.abs() - F::one()).abs())
                .max()
                .map_err(|_| {
                    FastIcaError::InvalidValue("de-mixing update is not finite".to_string())
                })?;

            w = wnew;

            if lim < self.tol() {
                break;
            }
        }

        Ok((w, n_iter, lim))
    }

    // Symmetric decorrelation
    //
    // W <- (W * W.T)^{-1/2} * W
    fn sym_decorrelation(w: &Array2<F>) -> Result<Array2<F>> {
        let (eig_val, eig_vec) = eigh_descending(&w.dot(&w.t()))?;

        let tmp = &eig_vec
            * &(eig_val.mapv(|x| x.max(F::zero()).sqrt()).mapv(|x| {
                // We lower bound the float value at 1e-7 when taking the reciprocal
                let lower_bound = F::cast(1e-7);
                if x < lower_bound {
                    return lower_bound.recip();
                }
                x.recip()
            }))
            .insert_axis(Axis(0));

        Ok(tmp.dot(&eig_vec.t()).dot(w))
    }
}

/// Fitted FastICA model for recovering the sources
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FastIca<F> {
    mean: Array1<F>,
    components: Array2<F>,
    mixing: Array2<F>,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> FastIca<F> {
    /// Unmixing matrix, ncomponents × nfeatures
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Mixing matrix, the pseudo-inverse of the unmixing matrix, nfeatures × ncomponents
    pub fn mixing(&self) -> &Array2<F> {
        &self.mixing
    }

    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Number of fixed-point iterations run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the last update fell below the tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float, D: Data<Elem = F>> Transformer<&ArrayBase<D, Ix2>, Array2<F>> for FastIca<F> {
    /// Recover the sources
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let xcentered = x - &self.mean.view().insert_axis(Axis(0));
        xcentered.dot(&self.components.t())
    }
}

impl<F: Float> Decomposer<F> for FastIcaParams<F> {
    fn method(&self) -> Method {
        Method::Ica
    }

    fn ncomponents(&self) -> usize {
        self.0.ncomponents()
    }

    fn decompose(&self, records: &Array2<F>) -> hemodecomp::Result<Decomposition<F>> {
        let ica: FastIca<F> = Fit::<_, FastIcaError>::fit(self, records)?;
        let sources = ica.transform(records);
        let diagnostics = FitDiagnostics::iterative(ica.n_iter, ica.converged);

        Decomposition::new(
            Method::Ica,
            sources,
            ica.mixing.reversed_axes(),
            ica.mean,
            diagnostics,
        )
    }
}

/// Some standard non-linear functions
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum GFunc {
    Logcosh(f64),
    Exp,
    Cube,
}

impl GFunc {
    // Function to select the correct non-linear function and execute it
    // returning a tuple, consisting of the first and second derivatives of the
    // non-linear function
    fn exec<A: Float>(&self, x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        match self {
            Self::Cube => Self::cube(x),
            Self::Exp => Self::exp(x),
            Self::Logcosh(alpha) => Self::logcosh(x, *alpha),
        }
    }

    fn cube<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        (
            x.mapv(|x| x.powi(3)),
            x.mapv(|x| A::cast(3.) * x.powi(2))
                .mean_axis(Axis(1))
                .unwrap(),
        )
    }

    fn exp<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        let exp = x.mapv(|x| (-x.powi(2) / A::cast(2.)).exp());
        (
            x * &exp,
            (x.mapv(|x| A::cast(1.) - x.powi(2)) * &exp)
                .mean_axis(Axis(1))
                .unwrap(),
        )
    }

    // alpha is checked to lie in [1, 2] by the parameter guard
    fn logcosh<A: Float>(x: &Array2<A>, alpha: f64) -> (Array2<A>, Array1<A>) {
        let alpha = A::cast(alpha);

        let gx = x.mapv(|x| (x * alpha).tanh());
        let g_x = gx.mapv(|x| alpha * (A::cast(1.) - x.powi(2)));

        (gx, g_x.mean_axis(Axis(1)).unwrap())
    }
}
