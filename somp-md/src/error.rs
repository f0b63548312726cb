//! Error types for somp-md
//!
//! Defines daemon-specific error types using thiserror for clear error
//! propagation. DSP failures from somp-dsp convert into the `Dsp` variant
//! so stage code can use a single `Result` alias throughout.

use thiserror::Error;

/// Main error type for the somp-md daemon
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Local file acquisition errors
    #[error("Error while copying file: {0}")]
    Copy(String),

    /// Remote file acquisition errors
    #[error("Error while downloading file: {0}")]
    Download(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio encoding errors
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Signal processing errors from the mastering library
    #[error("Processing error: {0}")]
    Dsp(#[from] somp_dsp::DspError),

    /// Completion callback delivery errors
    #[error("Callback error: {0}")]
    Callback(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job lifecycle errors
    #[error("Job error: {0}")]
    Job(String),
}

/// Result type alias for somp-md operations
pub type Result<T> = std::result::Result<T, Error>;
