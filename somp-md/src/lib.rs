//! # SOMP Mastering Daemon Library (somp-md)
//!
//! HTTP service around the somp-dsp mastering pipeline.
//!
//! **Purpose:** Accept mastering jobs over REST, acquire tracks into
//! per-job workspaces, run the requested effect or reference-mastering
//! stages, and deliver results to a callback URL.
//!
//! **Architecture:** axum front end over an mpsc-fed job manager; DSP
//! stages execute on the blocking thread pool behind a worker semaphore.

pub mod api;
pub mod callback;
pub mod codec;
pub mod config;
pub mod error;
pub mod jobs;
pub mod processing;
pub mod workspace;

pub use error::{Error, Result};
