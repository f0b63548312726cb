//! Audio resampling using rubato
//!
//! Converts signals to the canonical 44.1 kHz rate all analysis and
//! mastering runs at.

use crate::error::{DspError, Result};
use crate::signal::{AudioSignal, CANONICAL_SAMPLE_RATE};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Resample a signal to the canonical rate
///
/// Returns a copy without resampling when the input is already canonical.
pub fn to_canonical_rate(signal: &AudioSignal) -> Result<AudioSignal> {
    resample(signal, CANONICAL_SAMPLE_RATE)
}

/// Resample a signal to `output_rate`
pub fn resample(signal: &AudioSignal, output_rate: u32) -> Result<AudioSignal> {
    if signal.sample_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(signal.clone());
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels)",
        signal.sample_rate,
        output_rate,
        signal.channel_count()
    );

    // Process the whole buffer in one pass; chunk size is the input length
    let input_frames = signal.len();
    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / signal.sample_rate as f64,
        1.0, // max_relative_ratio (no runtime changes)
        PolynomialDegree::Septic,
        input_frames,
        signal.channel_count(),
    )
    .map_err(|e| DspError::Resample(format!("Failed to create resampler: {}", e)))?;

    let channels = resampler
        .process(&signal.channels, None)
        .map_err(|e| DspError::Resample(format!("Resampling failed: {}", e)))?;

    debug!(
        "Resampled {} input frames to {} output frames",
        input_frames,
        channels.first().map_or(0, |c| c.len())
    );

    Ok(AudioSignal {
        sample_rate: output_rate,
        channels,
    })
}
