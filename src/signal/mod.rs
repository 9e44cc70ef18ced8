//! Signal preparation
//!
//! Turns a raw T×C hemoglobin matrix, its time vector and the event table into the
//! [`PreparedSignal`] every decomposition method consumes. The steps run in a fixed order:
//!
//! 1. zero-phase FIR band-pass of every channel ([`filter`]), unless no band is given
//! 2. per-channel z-score over the full time axis ([`normalize`])
//! 3. boxcar task regressor sampled on the time vector ([`regressor`])

pub mod filter;
pub mod normalize;
pub mod regressor;

pub use regressor::{boxcar, Event};

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::subject::FrequencyBand;

/// Signal ready for decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSignal {
    /// Filtered and z-scored records, T×C
    pub records: Array2<f64>,
    /// Sample times in seconds, length T
    pub times: Array1<f64>,
    /// Boxcar task regressor, length T
    pub regressor: Array1<f64>,
    /// Channel names in column order
    pub channel_names: Vec<String>,
}

impl PreparedSignal {
    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nchannels(&self) -> usize {
        self.records.ncols()
    }
}

/// Sampling rate in Hz derived from the mean sample spacing
///
/// The time vector must hold at least two strictly increasing samples.
pub fn sampling_rate(times: &Array1<f64>) -> Result<f64> {
    if times.len() < 2 {
        return Err(Error::DegenerateSignal(format!(
            "at least 2 samples are needed to derive a sampling rate, got {}",
            times.len()
        )));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(Error::DegenerateSignal("time vector contains non-finite values".into()));
    }
    if times.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(Error::DegenerateSignal("time vector is not strictly increasing".into()));
    }

    let span = times[times.len() - 1] - times[0];
    Ok((times.len() - 1) as f64 / span)
}

/// Prepare a raw recording for decomposition
///
/// * `data`: raw T×C channel matrix
/// * `times`: sample times in seconds, length T
/// * `channel_names`: one name per column
/// * `events`: task blocks
/// * `band`: band-pass cutoffs, `None` skips filtering for input that is already filtered
pub fn prepare(
    mut data: Array2<f64>,
    times: Array1<f64>,
    channel_names: Vec<String>,
    events: &[Event],
    band: Option<&FrequencyBand>,
) -> Result<PreparedSignal> {
    if data.nrows() != times.len() {
        return Err(Error::LengthMismatch {
            context: "samples of the records and the time vector",
            expected: times.len(),
            actual: data.nrows(),
        });
    }
    if data.ncols() != channel_names.len() {
        return Err(Error::LengthMismatch {
            context: "channels of the records and the channel names",
            expected: channel_names.len(),
            actual: data.ncols(),
        });
    }
    if data.ncols() == 0 {
        return Err(Error::DegenerateSignal("recording has no channels".into()));
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(Error::DegenerateSignal("records contain non-finite values".into()));
    }

    let sfreq = sampling_rate(&times)?;
    if let Some(band) = band {
        filter::bandpass_channels_inplace(&mut data, band, sfreq)?;
    }

    normalize::zscore_channels_inplace(&mut data)?;
    let regressor = boxcar(&times, events)?;

    Ok(PreparedSignal {
        records: data,
        times,
        regressor,
        channel_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;
    use std::f64::consts::PI;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("S{}_D1 hbo", i)).collect()
    }

    #[test]
    fn sampling_rate_from_times() {
        let times = Array1::from_shape_fn(101, |i| 2. + i as f64 * 0.128);
        assert_abs_diff_eq!(sampling_rate(&times).unwrap(), 7.8125, epsilon = 1e-9);

        let reversed = ndarray::array![0., 1., 0.5];
        assert!(sampling_rate(&reversed).is_err());
        assert!(sampling_rate(&ndarray::array![0.]).is_err());
    }

    #[test]
    fn prepared_records_are_zscored() {
        let sfreq = 10.;
        let times = Array1::from_shape_fn(3000, |i| i as f64 / sfreq);
        let data = Array2::from_shape_fn((3000, 3), |(t, c)| {
            let t = t as f64 / sfreq;
            100. * c as f64 + (2. * PI * 0.05 * t + c as f64).sin() + 0.3 * (2. * PI * 2. * t).sin()
        });
        let events = vec![Event::new(20., 20.), Event::new(100., 20.)];

        let prepared = prepare(data, times, names(3), &events, Some(&FrequencyBand::default())).unwrap();

        assert_eq!(prepared.nsamples(), 3000);
        assert_eq!(prepared.nchannels(), 3);
        for column in prepared.records.axis_iter(Axis(1)) {
            assert_abs_diff_eq!(column.mean().unwrap(), 0., epsilon = 1e-9);
            assert_abs_diff_eq!(column.std(0.), 1., epsilon = 1e-9);
        }
        assert_eq!(prepared.regressor.sum(), 400.);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let times = Array1::from_shape_fn(10, |i| i as f64);
        let data = Array2::zeros((9, 2));
        assert!(matches!(
            prepare(data, times.clone(), names(2), &[], None),
            Err(Error::LengthMismatch { .. })
        ));

        let data = Array2::zeros((10, 2));
        assert!(matches!(
            prepare(data, times, names(3), &[], None),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn band_above_nyquist_is_rejected() {
        // 1 Hz sampling, Nyquist 0.5 Hz
        let times = Array1::from_shape_fn(100, |i| i as f64);
        let data = Array2::from_shape_fn((100, 2), |(t, c)| (t * (c + 1)) as f64);
        let band = FrequencyBand::new(0.1, 0.6).unwrap();

        assert!(matches!(
            prepare(data, times, names(2), &[], Some(&band)),
            Err(Error::InvalidBand { .. })
        ));
    }

    #[test]
    fn no_channels_is_degenerate() {
        let times = Array1::from_shape_fn(10, |i| i as f64);
        assert!(matches!(
            prepare(Array2::zeros((10, 0)), times, vec![], &[], None),
            Err(Error::DegenerateSignal(_))
        ));
    }
}
