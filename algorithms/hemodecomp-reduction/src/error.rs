use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReductionError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReductionError {
    #[error("At least 1 sample needed")]
    NotEnoughSamples,
    #[error("Number of components must be positive")]
    NoComponents,
    #[error("{ncomponents} components requested from {nsamples} samples x {nfeatures} features")]
    TooManyComponents {
        ncomponents: usize,
        nsamples: usize,
        nfeatures: usize,
    },
    #[error("records contain non-finite values")]
    NonFinite,
    #[error(transparent)]
    HemodecompError(#[from] hemodecomp::Error),
}

impl From<ReductionError> for hemodecomp::Error {
    fn from(err: ReductionError) -> Self {
        match err {
            ReductionError::NotEnoughSamples => {
                hemodecomp::Error::DegenerateSignal("at least 1 sample needed".to_string())
            }
            ReductionError::NoComponents => {
                hemodecomp::Error::Parameters("number of components must be positive".to_string())
            }
            ReductionError::TooManyComponents {
                ncomponents,
                nsamples,
                nfeatures,
            } => hemodecomp::Error::Dimension {
                ncomponents,
                nsamples,
                nchannels: nfeatures,
            },
            ReductionError::NonFinite => {
                hemodecomp::Error::DegenerateSignal("records contain non-finite values".to_string())
            }
            ReductionError::HemodecompError(err) => err,
        }
    }
}
