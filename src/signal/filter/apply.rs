//! Overlap-add zero-phase FIR convolution.
//!
//! The linear-phase delay of an odd length filter is `(N-1)/2` samples, so the zero-phase output
//! is the full convolution shifted left by that amount. Edge transients are suppressed by
//! reflect-limited padding of `N-1` samples on each side.
use ndarray::{Array2, ArrayView1, Axis};
use rustfft::{num_complex::Complex, FftPlanner};

/// Apply a zero-phase FIR filter to each channel (column) of `data` ([T, C]) in place.
///
/// `h` must have odd length.
pub fn apply_fir_zero_phase(data: &mut Array2<f64>, h: &[f64]) {
    for mut column in data.axis_iter_mut(Axis(1)) {
        let x = column.to_vec();
        let filtered = filter_1d(&x, h);
        column.assign(&ArrayView1::from(&filtered));
    }
}

/// Filter a single 1-D signal with the overlap-add algorithm.
///
/// Returns a vector of the same length as `x`.
pub fn filter_1d(x: &[f64], h: &[f64]) -> Vec<f64> {
    let n_x = x.len();
    let n_h = h.len();
    if n_x == 0 || n_h == 0 {
        return x.to_vec();
    }

    let shift = (n_h - 1) / 2;
    let n_edge = n_h - 1;

    let x_ext = reflect_limited_pad(x, n_edge);
    let n_ext = x_ext.len();

    let n_fft = choose_fft_len(n_h, n_ext);
    let n_seg = n_fft - n_h + 1;

    let mut planner = FftPlanner::<f64>::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);
    let inv_scale = 1.0 / n_fft as f64;

    let mut h_fft = zero_padded(h, n_fft);
    fft_fwd.process(&mut h_fft);

    // full linear convolution, length n_ext + n_h - 1
    let mut full = vec![0.0; n_ext + n_h - 1];
    let mut start = 0;
    while start < n_ext {
        let stop = (start + n_seg).min(n_ext);

        let mut buf = zero_padded(&x_ext[start..stop], n_fft);
        fft_fwd.process(&mut buf);
        for (b, hf) in buf.iter_mut().zip(h_fft.iter()) {
            *b *= hf;
        }
        fft_inv.process(&mut buf);

        let n_valid = (stop - start + n_h - 1).min(full.len() - start);
        for (o, b) in full[start..start + n_valid].iter_mut().zip(buf.iter()) {
            *o += b.re * inv_scale;
        }

        start = stop;
    }

    // undo the group delay, then strip the padding
    let offset = n_edge + shift;
    full[offset..offset + n_x].to_vec()
}

/// Reflect-limited padding by `n_pad` samples on both sides.
///
/// Left:  `pad[i] = 2*x[0] - x[i]`, right: `pad[i] = 2*x[-1] - x[-(i+1)]`. Padding that would
/// reach past the other end of the signal is filled with zeros.
fn reflect_limited_pad(x: &[f64], n_pad: usize) -> Vec<f64> {
    let n = x.len();
    let available = n_pad.min(n - 1);

    let mut out = Vec::with_capacity(n + 2 * n_pad);

    out.extend(std::iter::repeat(0.0).take(n_pad - available));
    out.extend((1..=available).rev().map(|i| 2.0 * x[0] - x[i]));

    out.extend_from_slice(x);

    let last = x[n - 1];
    out.extend((1..=available).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_pad - available));

    out
}

/// Power of two FFT block size minimising the overlap-add operation count:
///
///   cost = ceil(n_x / (N - n_h + 1)) * N * (log2(N) + 1) + 4e-5 * N * n_x
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    let mut best_n = 1usize << max_pow;
    let mut best_cost = f64::INFINITY;
    for pow in min_pow..=max_pow {
        let n = 1usize << pow;
        if n < min_fft {
            continue;
        }
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
            + 4e-5 * n as f64 * n_x as f64;
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }

    best_n
}

fn zero_padded(x: &[f64], n_fft: usize) -> Vec<Complex<f64>> {
    x.iter()
        .map(|&re| Complex { re, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n_fft)
        .collect()
}
