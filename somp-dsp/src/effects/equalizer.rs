//! Multi-band peaking equalizer

use super::biquad::Biquad;
use crate::signal::AudioSignal;

/// Fixed Q shared by all bands
const BAND_Q: f32 = 1.0;

/// One equalizer band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    /// Center frequency in Hz
    pub frequency: f32,
    /// Boost or cut in dB; 0 dB is a no-op
    pub gain_db: f32,
}

/// Apply a cascade of peaking sections to a signal, in place
///
/// Bands with 0 dB gain are skipped entirely, so the default submission
/// leaves the audio untouched.
pub fn equalize(signal: &mut AudioSignal, bands: &[EqBand]) {
    let sample_rate = signal.sample_rate as f32;
    for channel in &mut signal.channels {
        for band in bands {
            if band.gain_db == 0.0 {
                continue;
            }
            let mut section = Biquad::peaking(sample_rate, band.frequency, BAND_Q, band.gain_db);
            section.process(channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::rms;

    fn sine_signal(freq: f32, amplitude: f32) -> AudioSignal {
        let samples: Vec<f32> = (0..44100)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / 44100.0).sin() * amplitude)
            .collect();
        AudioSignal::stereo(samples.clone(), samples, 44100)
    }

    #[test]
    fn test_zero_gain_bands_are_noop() {
        let mut signal = sine_signal(440.0, 0.5);
        let original = signal.channels.clone();

        equalize(
            &mut signal,
            &[
                EqBand {
                    frequency: 100.0,
                    gain_db: 0.0,
                },
                EqBand {
                    frequency: 1000.0,
                    gain_db: 0.0,
                },
            ],
        );

        assert_eq!(signal.channels, original);
    }

    #[test]
    fn test_boost_raises_level_at_center() {
        let mut signal = sine_signal(1000.0, 0.25);
        let before = rms(&signal.channels[0][11025..]);

        equalize(
            &mut signal,
            &[EqBand {
                frequency: 1000.0,
                gain_db: 6.0,
            }],
        );

        let after = rms(&signal.channels[0][11025..]);
        let gain_db = 20.0 * (after / before).log10();
        assert!((gain_db - 6.0).abs() < 0.5, "gain {} dB", gain_db);
    }

    #[test]
    fn test_both_channels_filtered() {
        let mut signal = sine_signal(500.0, 0.25);
        equalize(
            &mut signal,
            &[EqBand {
                frequency: 500.0,
                gain_db: -12.0,
            }],
        );

        let left = rms(&signal.channels[0][11025..]);
        let right = rms(&signal.channels[1][11025..]);
        assert!((left - right).abs() < 1e-9);
        assert!(left < 0.1);
    }
}
