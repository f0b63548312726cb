//! Error types for somp-dsp
//!
//! Defines library-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for somp-dsp operations
#[derive(Error, Debug)]
pub enum DspError {
    /// Channel layout cannot be canonicalized to stereo
    #[error("Unsupported channel layout: {0} channels (expected mono or stereo)")]
    ChannelLayout(usize),

    /// Track duration outside the accepted range
    #[error("Invalid track length: {0}")]
    TrackLength(String),

    /// Loudness analysis found no usable signal
    #[error("Silent track: {0}")]
    SilentTrack(String),

    /// Resampler construction or processing errors
    #[error("Resample error: {0}")]
    Resample(String),

    /// Mismatched buffer shapes between processing stages
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using somp-dsp DspError
pub type Result<T> = std::result::Result<T, DspError>;
