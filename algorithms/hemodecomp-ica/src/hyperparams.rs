use crate::{error::FastIcaError, fast_ica::FastIca, fast_ica::GFunc};
use hemodecomp::{decomposition::ConvergencePolicy, Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Fast Independent Component Analysis (ICA)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub struct FastIcaValidParams<F: Float> {
    ncomponents: usize,
    gfunc: GFunc,
    max_iter: usize,
    tol: F,
    random_state: u64,
    convergence: ConvergencePolicy,
}

impl<F: Float> FastIcaValidParams<F> {
    pub fn ncomponents(&self) -> usize {
        self.ncomponents
    }

    pub fn gfunc(&self) -> &GFunc {
        &self.gfunc
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    pub fn convergence(&self) -> ConvergencePolicy {
        self.convergence
    }
}

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub struct FastIcaParams<F: Float>(pub(crate) FastIcaValidParams<F>);

impl<F: Float> Default for FastIcaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> FastIca<F> {
    pub fn params() -> FastIcaParams<F> {
        FastIcaParams::new()
    }
}

impl<F: Float> FastIcaParams<F> {
    /// Create new FastICA algorithm with default values for its parameters
    ///
    /// Ten components, logcosh with `alpha = 1`, at most 5000 iterations with a tolerance of
    /// `1e-3`, seed 0 and a warning when the iteration does not converge.
    pub fn new() -> Self {
        Self(FastIcaValidParams {
            ncomponents: 10,
            gfunc: GFunc::Logcosh(1.),
            max_iter: 5000,
            tol: F::cast(1e-3),
            random_state: 0,
            convergence: ConvergencePolicy::Warn,
        })
    }

    /// Set the number of components to extract
    pub fn ncomponents(mut self, ncomponents: usize) -> Self {
        self.0.ncomponents = ncomponents;
        self
    }

    /// G function used in the approximation to neg-entropy, refer [`GFunc`]
    pub fn gfunc(mut self, gfunc: GFunc) -> Self {
        self.0.gfunc = gfunc;
        self
    }

    /// Set maximum number of iterations during fit
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set tolerance on upate at each iteration
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set seed for random number generator for reproducible results.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = random_state;
        self
    }

    /// Decide what happens when `max_iter` is exhausted before reaching `tol`
    pub fn convergence(mut self, convergence: ConvergencePolicy) -> Self {
        self.0.convergence = convergence;
        self
    }
}

impl<F: Float> ParamGuard for FastIcaParams<F> {
    type Checked = FastIcaValidParams<F>;
    type Error = FastIcaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.tol <= F::zero() || !self.0.tol.is_finite() {
            return Err(FastIcaError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if self.0.ncomponents == 0 {
            return Err(FastIcaError::InvalidValue(
                "ncomponents must be positive".to_string(),
            ));
        }
        if self.0.max_iter == 0 {
            return Err(FastIcaError::InvalidValue(
                "max_iter must be positive".to_string(),
            ));
        }
        if let GFunc::Logcosh(alpha) = self.0.gfunc {
            if !(1.0..=2.0).contains(&alpha) {
                return Err(FastIcaError::InvalidValue(format!(
                    "alpha must be between 1 and 2 inclusive, got {}",
                    alpha
                )));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
