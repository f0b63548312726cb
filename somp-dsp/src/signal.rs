//! Audio signal model
//!
//! Planar f32 sample buffers plus the mid/side transform used throughout
//! the mastering pipeline. All processing downstream of validation assumes
//! the canonical stereo / 44100 Hz layout.

use crate::error::{DspError, Result};

/// Canonical processing sample rate (Hz)
pub const CANONICAL_SAMPLE_RATE: u32 = 44100;

/// Planar audio buffer with its sample rate
///
/// Channels are stored as separate `Vec<f32>` buffers of equal length.
#[derive(Debug, Clone)]
pub struct AudioSignal {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// One buffer per channel, equal lengths
    pub channels: Vec<Vec<f32>>,
}

impl AudioSignal {
    /// Create a mono signal
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![samples],
        }
    }

    /// Create a stereo signal from left/right buffers
    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![left, right],
        }
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel (0 for a channel-less signal)
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    /// True when there are no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds at this signal's sample rate
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Mid/side decomposition of a stereo signal
///
/// `mid = (L + R) / 2`, `side = (L - R) / 2`. Reconstruction is
/// `L = mid + side`, `R = mid - side`.
#[derive(Debug, Clone)]
pub struct MidSide {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sum channel
    pub mid: Vec<f32>,
    /// Difference channel
    pub side: Vec<f32>,
}

impl MidSide {
    /// Decompose a stereo signal into mid/side
    ///
    /// Returns an error for any channel count other than 2.
    pub fn from_stereo(signal: &AudioSignal) -> Result<Self> {
        if signal.channel_count() != 2 {
            return Err(DspError::ChannelLayout(signal.channel_count()));
        }
        let left = &signal.channels[0];
        let right = &signal.channels[1];
        if left.len() != right.len() {
            return Err(DspError::InvalidState(format!(
                "channel length mismatch: {} vs {}",
                left.len(),
                right.len()
            )));
        }

        let mut mid = Vec::with_capacity(left.len());
        let mut side = Vec::with_capacity(left.len());
        for (l, r) in left.iter().zip(right.iter()) {
            mid.push((l + r) * 0.5);
            side.push((l - r) * 0.5);
        }

        Ok(Self {
            sample_rate: signal.sample_rate,
            mid,
            side,
        })
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.mid.len()
    }

    /// True when there are no samples
    pub fn is_empty(&self) -> bool {
        self.mid.is_empty()
    }

    /// Recombine into a stereo signal
    pub fn into_stereo(self) -> AudioSignal {
        let mut left = Vec::with_capacity(self.mid.len());
        let mut right = Vec::with_capacity(self.mid.len());
        for (m, s) in self.mid.iter().zip(self.side.iter()) {
            left.push(m + s);
            right.push(m - s);
        }
        AudioSignal::stereo(left, right, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mid_side_round_trip() {
        let left = vec![0.5, -0.25, 0.125, 1.0, -1.0];
        let right = vec![0.25, 0.75, -0.5, -1.0, 1.0];
        let signal = AudioSignal::stereo(left.clone(), right.clone(), 44100);

        let ms = MidSide::from_stereo(&signal).unwrap();
        let back = ms.into_stereo();

        for i in 0..left.len() {
            assert_abs_diff_eq!(back.channels[0][i], left[i], epsilon = 1e-6);
            assert_abs_diff_eq!(back.channels[1][i], right[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mid_side_formulas() {
        let signal = AudioSignal::stereo(vec![1.0, 0.0], vec![0.0, 1.0], 44100);
        let ms = MidSide::from_stereo(&signal).unwrap();

        assert_abs_diff_eq!(ms.mid[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ms.side[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ms.mid[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ms.side[1], -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_mid_side_rejects_mono() {
        let signal = AudioSignal::mono(vec![0.1, 0.2], 44100);
        assert!(matches!(
            MidSide::from_stereo(&signal),
            Err(DspError::ChannelLayout(1))
        ));
    }

    #[test]
    fn test_duration() {
        let signal = AudioSignal::mono(vec![0.0; 44100], 44100);
        assert_abs_diff_eq!(signal.duration_secs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_peak() {
        let signal = AudioSignal::stereo(vec![0.3, -0.9], vec![0.2, 0.8], 44100);
        assert_abs_diff_eq!(signal.peak(), 0.9, epsilon = 1e-9);
    }
}
