//! # SOMP DSP Library (somp-dsp)
//!
//! Signal analysis and mastering transforms for the SOMP mastering daemon.
//!
//! **Purpose:** Validate and canonicalize audio, analyze piecewise loudness,
//! design and apply reference-matching FIR filters, and run the shallow
//! equalizer/compressor/normalizer effects.
//!
//! **Architecture:** Pure synchronous library over planar f32 buffers using
//! rustfft + rubato; file and network I/O live in somp-md.

pub mod convolve;
pub mod effects;
pub mod error;
pub mod loudness;
pub mod mastering;
pub mod resample;
pub mod signal;
pub mod smoothing;
pub mod spectrum;
pub mod validate;

pub use error::{DspError, Result};
pub use mastering::{master_by_reference, MatchConfig};
pub use signal::{AudioSignal, MidSide, CANONICAL_SAMPLE_RATE};
