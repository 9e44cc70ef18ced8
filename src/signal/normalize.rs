//! Per-channel z-score normalisation.
//!
//! Every column (channel) of a T×C matrix is centred and divided by its population standard
//! deviation (ddof = 0) plus [`STD_FLOOR`]:
//!
//!   x[:, c] = (x[:, c] - mean(x[:, c])) / (std(x[:, c]) + 1e-12)
//!
//! The floor keeps constant channels finite; they come out as all zeros.
use ndarray::{Array1, Array2, Axis};

use crate::error::{Error, Result};
use crate::Float;

/// Added to every standard deviation before dividing.
pub const STD_FLOOR: f64 = 1e-12;

/// Z-score every channel of `data` ([T, C]) in place.
/// Returns the per-channel (mean, std) used for normalisation, std without the floor.
pub fn zscore_channels_inplace<F: Float>(data: &mut Array2<F>) -> Result<(Array1<F>, Array1<F>)> {
    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::DegenerateSignal("cannot normalise a signal without samples".into()))?;
    let std = data.std_axis(Axis(0), F::zero());

    let denom = std.mapv(|s| s + F::cast(STD_FLOOR));
    *data -= &mean.view().insert_axis(Axis(0));
    *data /= &denom.view().insert_axis(Axis(0));

    Ok((mean, std))
}
