//! Shallow per-track effects
//!
//! The equalizer, compressor, and normalizer behind the non-reference
//! mastering operations. All are pure in-place transforms over planar
//! stereo signals.

pub mod biquad;
pub mod compressor;
pub mod equalizer;
pub mod normalizer;

pub use compressor::{compress, CompressorParams};
pub use equalizer::{equalize, EqBand};
pub use normalizer::normalize_peak;

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
#[inline]
pub fn amplitude_to_db(amp: f32) -> f32 {
    if amp <= 0.0 {
        -96.0 // Floor
    } else {
        20.0 * amp.log10()
    }
}
