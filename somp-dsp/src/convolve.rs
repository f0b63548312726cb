//! Frequency-domain convolution
//!
//! Overlap-add FFT convolution for applying the matching FIR filters to
//! full-length channels. Output placement follows the centered "same"
//! convention, so a centered unit-impulse kernel is an identity.

use rustfft::{num_complex::Complex, FftPlanner};

/// Convolve `signal` with `kernel`, keeping the centered slice so the
/// output length equals the signal length
///
/// The slice starts `(kernel_len - 1) / 2` into the full convolution.
pub fn convolve_same(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let full = convolve_full(signal, kernel);
    let offset = (kernel.len() - 1) / 2;
    full[offset..offset + signal.len()].to_vec()
}

/// Full linear convolution (`signal_len + kernel_len - 1` samples) via
/// overlap-add FFT blocks
pub fn convolve_full(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = (4 * kernel.len()).next_power_of_two().max(64);
    let block_len = fft_len - kernel.len() + 1;

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    // Kernel spectrum, computed once and reused for every block
    let mut kernel_fd = vec![Complex::new(0.0f32, 0.0f32); fft_len];
    for (slot, &h) in kernel_fd.iter_mut().zip(kernel.iter()) {
        *slot = Complex::new(h, 0.0);
    }
    forward.process(&mut kernel_fd);

    let scale = 1.0 / fft_len as f32;
    let mut out = vec![0.0f32; out_len];
    let mut block_fd = vec![Complex::new(0.0f32, 0.0f32); fft_len];

    for (block_idx, block) in signal.chunks(block_len).enumerate() {
        block_fd.fill(Complex::new(0.0, 0.0));
        for (slot, &s) in block_fd.iter_mut().zip(block.iter()) {
            *slot = Complex::new(s, 0.0);
        }
        forward.process(&mut block_fd);
        for (b, k) in block_fd.iter_mut().zip(kernel_fd.iter()) {
            *b *= *k;
        }
        inverse.process(&mut block_fd);

        let start = block_idx * block_len;
        let take = (out_len - start).min(fft_len);
        for (i, value) in block_fd.iter().take(take).enumerate() {
            out[start + i] += value.re * scale;
        }
    }
    out
}
