//! FIR band-pass design, following MNE's automatic parameters for
//! `raw.filter(l_freq, h_freq, fir_window='hamming', fir_design='firwin')`:
//!
//!   • lower transition bandwidth  = min(max(0.25 * l_freq, 2.0), l_freq)
//!   • upper transition bandwidth  = min(max(0.25 * h_freq, 2.0), sfreq / 2 - h_freq)
//!   • filter length N             = round(3.3 / min(l_trans, h_trans) * sfreq), made odd
//!   • windowed-sinc design: lowpass at the middle of the upper transition band minus
//!     lowpass at the middle of the lower transition band, each lowpass with the length of its
//!     own transition band and centered in the N taps
use std::f64::consts::PI;

use crate::error::Result;
use crate::subject::FrequencyBand;

/// Lower transition bandwidth in Hz.
pub fn low_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Upper transition bandwidth in Hz.
pub fn high_trans_bandwidth(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for a given transition bandwidth.
/// Returns an odd integer, as required for a zero-phase linear-phase FIR.
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (3.3 / trans_bw * sfreq).round().max(1.) as usize;
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Design a zero-phase band-pass FIR filter for `band` at sampling rate `sfreq`.
///
/// Fails if the band's high cutoff is not below Nyquist.
pub fn design_bandpass(band: &FrequencyBand, sfreq: f64) -> Result<Vec<f64>> {
    band.check_nyquist(sfreq)?;

    let l_trans = low_trans_bandwidth(band.low());
    let h_trans = high_trans_bandwidth(band.high(), sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);

    let low_cut = band.low() - l_trans / 2.0;
    let high_cut = band.high() + h_trans / 2.0;

    let h_high = centered_lowpass(n, auto_filter_length(h_trans, sfreq), high_cut, sfreq);
    let h_low = centered_lowpass(n, auto_filter_length(l_trans, sfreq), low_cut, sfreq);

    Ok(h_high.iter().zip(h_low.iter()).map(|(a, b)| a - b).collect())
}

/// Lowpass of `len` taps zero-padded on both sides to `n` taps (both odd).
fn centered_lowpass(n: usize, len: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    let len = len.min(n);
    let offset = (n - len) / 2;
    let mut h = vec![0.0; n];
    h[offset..offset + len].copy_from_slice(&firwin_lowpass(len, cutoff_hz, sfreq));
    h
}

/// Lowpass FIR filter of odd length `n` using a Hamming-windowed sinc.
///
/// `cutoff_hz` is the -6 dB point. The taps are normalised to unit DC gain.
pub fn firwin_lowpass(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz / (sfreq / 2.0);
    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x) / (π·x) → fc at x = 0
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    let s: f64 = h.iter().sum();
    if s != 0.0 {
        h.iter_mut().for_each(|v| *v /= s);
    }

    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Magnitude of the frequency response of `h` at `freq` Hz.
pub fn gain_at(h: &[f64], freq: f64, sfreq: f64) -> f64 {
    let omega = 2.0 * PI * freq / sfreq;
    let (re, im) = h.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &v)| {
        let phase = omega * k as f64;
        (re + v * phase.cos(), im - v * phase.sin())
    });
    (re * re + im * im).sqrt()
}
