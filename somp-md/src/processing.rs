//! File-level processing stages
//!
//! Each stage decodes its input file, applies one transform from somp-dsp,
//! and writes the result into the job directory as a stage-named WAV:
//! `equalized_<id>.wav`, `compressed_<id>.wav`, `normalized_<id>.wav`, or
//! `mastered_<id>.wav`. Stage outputs feed the next stage's input.
//!
//! These functions are CPU-bound and synchronous; the job runner executes
//! them on the blocking thread pool.

use std::path::{Path, PathBuf};

use somp_dsp::effects::{self, CompressorParams, EqBand};
use somp_dsp::{master_by_reference, MatchConfig};
use tracing::info;

use crate::codec;
use crate::error::Result;

/// Apply a cascade of peaking filters.
pub fn equalize_file(input: &Path, dir: &Path, id: &str, bands: &[EqBand]) -> Result<PathBuf> {
    let mut signal = codec::decode(input)?;
    effects::equalize(&mut signal, bands);

    let output = dir.join(format!("equalized_{}.wav", id));
    codec::encode_wav(&signal, &output)?;
    info!(job_id = %id, "Equalized {} bands into {}", bands.len(), output.display());
    Ok(output)
}

/// Apply downward compression.
pub fn compress_file(
    input: &Path,
    dir: &Path,
    id: &str,
    params: &CompressorParams,
) -> Result<PathBuf> {
    let mut signal = codec::decode(input)?;
    effects::compress(&mut signal, params);

    let output = dir.join(format!("compressed_{}.wav", id));
    codec::encode_wav(&signal, &output)?;
    info!(
        job_id = %id,
        "Compressed at {} dB threshold, {}:1 into {}",
        params.threshold_db,
        params.ratio,
        output.display()
    );
    Ok(output)
}

/// Normalize the peak level to `target_db` dBFS.
pub fn normalize_file(input: &Path, dir: &Path, id: &str, target_db: f32) -> Result<PathBuf> {
    let mut signal = codec::decode(input)?;
    effects::normalize_peak(&mut signal, target_db);

    let output = dir.join(format!("normalized_{}.wav", id));
    codec::encode_wav(&signal, &output)?;
    info!(job_id = %id, "Normalized to {} dBFS into {}", target_db, output.display());
    Ok(output)
}

/// Master the target against a reference track.
pub fn master_file(target: &Path, reference: &Path, dir: &Path, id: &str) -> Result<PathBuf> {
    let target_signal = codec::decode(target)?;
    let reference_signal = codec::decode(reference)?;

    let mastered = master_by_reference(&target_signal, &reference_signal, &MatchConfig::default())?;

    let output = dir.join(format!("mastered_{}.wav", id));
    codec::encode_wav(&mastered, &output)?;
    info!(job_id = %id, "Mastered by reference into {}", output.display());
    Ok(output)
}
