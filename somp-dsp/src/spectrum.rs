//! Spectral analysis and FIR synthesis
//!
//! The frequency-domain half of reference matching: averaged magnitude
//! spectra over loudest pieces, the reference/target matching curve, the
//! log-frequency analysis grids, and conversion of a smoothed curve into a
//! time-domain FIR filter.

use crate::error::{DspError, Result};
use rustfft::{num_complex::Complex, FftPlanner};

/// Mean magnitude spectrum across all full analysis windows of all pieces
///
/// Rectangular window, no overlap; trailing partial windows are discarded.
/// Returns `fft_size / 2 + 1` bins. Fails when no piece holds even one
/// full window.
pub fn average_spectrum(pieces: &[&[f32]], fft_size: usize) -> Result<Vec<f64>> {
    let bins = fft_size / 2 + 1;
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut sums = vec![0.0f64; bins];
    let mut windows = 0usize;
    let mut buffer = vec![Complex::new(0.0f64, 0.0f64); fft_size];

    for piece in pieces {
        for window in piece.chunks_exact(fft_size) {
            for (slot, &sample) in buffer.iter_mut().zip(window.iter()) {
                *slot = Complex::new(sample as f64, 0.0);
            }
            fft.process(&mut buffer);
            for (sum, value) in sums.iter_mut().zip(buffer.iter().take(bins)) {
                *sum += value.norm();
            }
            windows += 1;
        }
    }

    if windows == 0 {
        return Err(DspError::InvalidState(
            "no full analysis window in the selected pieces".into(),
        ));
    }

    for sum in &mut sums {
        *sum /= windows as f64;
    }
    Ok(sums)
}

/// Matching curve: reference spectrum over floored target spectrum
///
/// The floor keeps near-empty target bins from exploding the ratio.
pub fn matching_curve(target: &[f64], reference: &[f64], min_value: f64) -> Vec<f64> {
    reference
        .iter()
        .zip(target.iter())
        .map(|(r, t)| r / t.max(min_value))
        .collect()
}

/// Linear grid of bin-center frequencies in Hz (`fft_size / 2 + 1` points)
pub fn linear_grid(sample_rate: u32, fft_size: usize) -> Vec<f64> {
    let bins = fft_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    (0..bins)
        .map(|k| nyquist * k as f64 / (bins - 1) as f64)
        .collect()
}

/// Oversampled logarithmic frequency grid in Hz
///
/// Runs from the fourth linear bin's frequency up to Nyquist with
/// `fft_size / 2 * oversampling + 1` points, log-spaced.
pub fn log_grid(sample_rate: u32, fft_size: usize, oversampling: usize) -> Vec<f64> {
    let points = fft_size / 2 * oversampling + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let start_exp = (4.0 / fft_size as f64).log10();
    (0..points)
        .map(|k| {
            let exp = start_exp * (1.0 - k as f64 / (points - 1) as f64);
            nyquist * 10f64.powf(exp)
        })
        .collect()
}

/// Convert a real, zero-phase spectrum into a centered FIR filter
///
/// Inverse real transform, circular re-center, Hann taper. The filter
/// length is `(curve.len() - 1) * 2`.
pub fn fir_from_curve(curve: &[f64]) -> Vec<f32> {
    let n = (curve.len().saturating_sub(1)) * 2;
    if n == 0 {
        return Vec::new();
    }

    // Hermitian-symmetric spectrum of a real, zero-phase response
    let mut buffer = vec![Complex::new(0.0f64, 0.0f64); n];
    for (k, &value) in curve.iter().enumerate() {
        buffer[k] = Complex::new(value, 0.0);
        if k > 0 && k < n / 2 {
            buffer[n - k] = Complex::new(value, 0.0);
        }
    }

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_inverse(n).process(&mut buffer);

    let mut fir: Vec<f64> = buffer.iter().map(|c| c.re / n as f64).collect();
    fir.rotate_right(n / 2);

    let window = hann_window(n);
    fir.iter()
        .zip(window.iter())
        .map(|(h, w)| (h * w) as f32)
        .collect()
}

/// Symmetric Hann window (zero at both endpoints)
fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}
