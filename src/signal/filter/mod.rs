//! FIR band-pass filtering.
//!
//! - [`design`]: Hamming-windowed sinc band-pass design with automatic transition bandwidths
//!   and filter length.
//! - [`apply`]: overlap-add zero-phase convolution with reflect-limited edge padding.

pub mod apply;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_1d};
pub use design::{auto_filter_length, design_bandpass, firwin_lowpass, hamming};

use ndarray::Array2;

use crate::error::Result;
use crate::subject::FrequencyBand;

/// Band-pass every channel (column) of `data` ([T, C]) in place
pub fn bandpass_channels_inplace(data: &mut Array2<f64>, band: &FrequencyBand, sfreq: f64) -> Result<()> {
    let h = design_bandpass(band, sfreq)?;
    apply_fir_zero_phase(data, &h);
    Ok(())
}
