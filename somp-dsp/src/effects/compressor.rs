//! Linked-stereo feed-forward compressor

use super::db_to_amplitude;
use crate::signal::AudioSignal;

/// Compressor parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// Threshold in dBFS above which gain reduction starts
    pub threshold_db: f32,
    /// Compression ratio (n:1)
    pub ratio: f32,
    /// Attack time in milliseconds
    pub attack_ms: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
        }
    }
}

/// Smoothing coefficient for a time constant in milliseconds
fn time_to_coeff(ms: f32, sample_rate: u32) -> f32 {
    if ms <= 0.0 {
        0.0
    } else {
        (-1.0 / (ms * 0.001 * sample_rate as f32)).exp()
    }
}

/// Compress a signal in place
///
/// The detector follows the loudest channel and the same gain is applied
/// to every channel, so the stereo image does not wander.
pub fn compress(signal: &mut AudioSignal, params: &CompressorParams) {
    let attack = time_to_coeff(params.attack_ms, signal.sample_rate);
    let release = time_to_coeff(params.release_ms, signal.sample_rate);
    let threshold = db_to_amplitude(params.threshold_db);
    let ratio = params.ratio.max(1.0);

    let len = signal.len();
    let mut envelope = 0.0f32;
    for i in 0..len {
        let peak = signal
            .channels
            .iter()
            .map(|c| c[i].abs())
            .fold(0.0f32, f32::max);
        envelope = if peak > envelope {
            attack * envelope + (1.0 - attack) * peak
        } else {
            release * envelope + (1.0 - release) * peak
        };

        let gain = if envelope > threshold && envelope > 1e-12 {
            let over_db = 20.0 * (envelope / threshold).log10();
            let reduction_db = over_db * (1.0 - 1.0 / ratio);
            db_to_amplitude(-reduction_db)
        } else {
            1.0
        };
        for channel in &mut signal.channels {
            channel[i] *= gain;
        }
    }
}
