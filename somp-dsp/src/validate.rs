//! Input validation and canonicalization
//!
//! Gates a signal before mastering analysis: duration limits are checked at
//! the source rate, mono is widened to stereo, anything else is rejected,
//! and the result is resampled to the canonical rate.

use crate::error::{DspError, Result};
use crate::resample;
use crate::signal::{AudioSignal, CANONICAL_SAMPLE_RATE};

/// Validate a signal and convert it to canonical stereo form
///
/// `max_duration_secs` bounds the track length; the minimum length is one
/// analysis window of `fft_size` samples, scaled to the source rate.
pub fn canonicalize(
    signal: &AudioSignal,
    max_duration_secs: u32,
    fft_size: usize,
) -> Result<AudioSignal> {
    let len = signal.len();
    let max_samples = max_duration_secs as usize * signal.sample_rate as usize;
    let min_samples =
        (fft_size * signal.sample_rate as usize / CANONICAL_SAMPLE_RATE as usize).max(1);

    if len > max_samples {
        return Err(DspError::TrackLength(format!(
            "{:.1} s exceeds the {} s maximum",
            signal.duration_secs(),
            max_duration_secs
        )));
    }
    if len < min_samples {
        return Err(DspError::TrackLength(format!(
            "{} samples is shorter than one {} sample analysis window",
            len, min_samples
        )));
    }

    let stereo = match signal.channel_count() {
        1 => AudioSignal::stereo(
            signal.channels[0].clone(),
            signal.channels[0].clone(),
            signal.sample_rate,
        ),
        2 => signal.clone(),
        other => return Err(DspError::ChannelLayout(other)),
    };

    resample::to_canonical_rate(&stereo)
}
