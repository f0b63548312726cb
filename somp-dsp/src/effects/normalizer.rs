//! Peak normalization

use super::db_to_amplitude;
use crate::signal::AudioSignal;

/// Scale a signal in place so its peak lands on `target_db` dBFS
///
/// Silent input is left unchanged, there is nothing to scale.
pub fn normalize_peak(signal: &mut AudioSignal, target_db: f32) {
    let peak = signal.peak();
    if peak <= 0.0 {
        return;
    }
    let gain = db_to_amplitude(target_db) / peak;
    for channel in &mut signal.channels {
        for s in channel.iter_mut() {
            *s *= gain;
        }
    }
}
