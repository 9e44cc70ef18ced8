use thiserror::Error;

pub type Result<T> = std::result::Result<T, FastIcaError>;

/// An error when modeling FastICA algorithm
#[derive(Error, Debug)]
pub enum FastIcaError {
    /// When there are no samples in the provided dataset
    #[error("Dataset must contain at least one sample")]
    NotEnoughSamples,
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
    #[error("tolerance should be positive but is {0}")]
    InvalidTolerance(f32),
    /// The number of components cannot exceed the minimum of samples and features
    #[error("ncomponents cannot be greater than min({nsamples}, {nfeatures}), got {ncomponents}")]
    TooManyComponents {
        ncomponents: usize,
        nsamples: usize,
        nfeatures: usize,
    },
    /// The fixed-point iteration exhausted its budget under the strict convergence policy
    #[error("FastICA did not converge after {iterations} iterations, last update {last_update:.3e} above tolerance {tol:.3e}")]
    NotConverged {
        iterations: usize,
        last_update: f64,
        tol: f64,
    },
    #[error(transparent)]
    HemodecompError(#[from] hemodecomp::Error),
}

impl From<FastIcaError> for hemodecomp::Error {
    fn from(err: FastIcaError) -> Self {
        match err {
            FastIcaError::NotEnoughSamples => {
                hemodecomp::Error::DegenerateSignal("at least one sample needed".to_string())
            }
            FastIcaError::InvalidValue(msg) => hemodecomp::Error::Parameters(msg),
            FastIcaError::InvalidTolerance(tol) => {
                hemodecomp::Error::Parameters(format!("tolerance should be positive but is {}", tol))
            }
            FastIcaError::TooManyComponents {
                ncomponents,
                nsamples,
                nfeatures,
            } => hemodecomp::Error::Dimension {
                ncomponents,
                nsamples,
                nchannels: nfeatures,
            },
            FastIcaError::NotConverged {
                iterations,
                last_update,
                tol,
            } => hemodecomp::Error::NotConverged {
                iterations,
                last_update,
                tol,
            },
            FastIcaError::HemodecompError(err) => err,
        }
    }
}
