//! Reference mastering engine
//!
//! Matches a target track's loudness and tonal balance to a reference
//! track: validation and canonicalization, mid/side decomposition,
//! piecewise loudness matching, FIR design from averaged loudest-piece
//! spectra, frequency-domain filtering, and iterative loudness re-matching
//! of the filtered result.

use crate::convolve::convolve_same;
use crate::error::{DspError, Result};
use crate::loudness::{analyze_loudness, PiecePlan};
use crate::signal::{AudioSignal, MidSide, CANONICAL_SAMPLE_RATE};
use crate::smoothing::{cubic_interp, lowess};
use crate::spectrum;
use crate::validate::canonicalize;
use tracing::debug;

/// Tunable constants of the matching pipeline
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Analysis window and FIR length in samples
    pub fft_size: usize,
    /// Nominal loudness piece duration in seconds
    pub piece_duration_secs: u32,
    /// Maximum accepted track duration in seconds
    pub max_duration_secs: u32,
    /// Log-grid oversampling factor
    pub oversampling: usize,
    /// Smoothing neighborhood as a fraction of the curve length
    pub lowess_frac: f64,
    /// Floor applied to the target spectrum before the ratio
    pub min_value: f64,
    /// Loudness correction passes after filtering
    pub rms_correction_steps: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            piece_duration_secs: 15,
            max_duration_secs: 900,
            oversampling: 4,
            lowess_frac: 0.0375,
            min_value: 1e-6,
            rms_correction_steps: 4,
        }
    }
}

/// Master `target` against `reference`
///
/// Accepts arbitrary rates and mono or stereo layouts; the output is
/// stereo at the canonical rate with the target's (canonicalized)
/// duration.
pub fn master_by_reference(
    target: &AudioSignal,
    reference: &AudioSignal,
    config: &MatchConfig,
) -> Result<AudioSignal> {
    let target = canonicalize(target, config.max_duration_secs, config.fft_size)?;
    let reference = canonicalize(reference, config.max_duration_secs, config.fft_size)?;

    let mut targ = MidSide::from_stereo(&target)?;
    let refr = MidSide::from_stereo(&reference)?;

    let nominal = config.piece_duration_secs as usize * CANONICAL_SAMPLE_RATE as usize;
    let targ_plan = PiecePlan::new(targ.len(), nominal);
    let ref_plan = PiecePlan::new(refr.len(), nominal);
    let targ_profile = analyze_loudness(&targ.mid, targ_plan);
    let ref_profile = analyze_loudness(&refr.mid, ref_plan);
    debug!(
        "Loudness pieces: target {} of {}, reference {} of {}",
        targ_profile.loudest.len(),
        targ_plan.count,
        ref_profile.loudest.len(),
        ref_plan.count
    );

    if targ_profile.match_rms == 0.0 {
        return Err(DspError::SilentTrack(
            "target has no audible content".into(),
        ));
    }
    if ref_profile.match_rms == 0.0 {
        return Err(DspError::SilentTrack(
            "reference has no audible content".into(),
        ));
    }

    // Level-match the target before tonal analysis so the matching curve
    // reflects spectrum shape, not overall loudness.
    let coefficient = ref_profile.match_rms / targ_profile.match_rms;
    debug!("Loudness coefficient: {:.6}", coefficient);
    scale(&mut targ.mid, coefficient);
    scale(&mut targ.side, coefficient);

    let targ_mid_pieces = targ_profile.loudest_pieces(&targ.mid);
    let targ_side_pieces = targ_profile.loudest_pieces(&targ.side);
    let ref_mid_pieces = ref_profile.loudest_pieces(&refr.mid);
    let ref_side_pieces = ref_profile.loudest_pieces(&refr.side);

    let mid_fir = design_fir(&targ_mid_pieces, &ref_mid_pieces, config)?;
    let side_fir = design_fir(&targ_side_pieces, &ref_side_pieces, config)?;

    let mut mid = convolve_same(&targ.mid, &mid_fir);
    let mut side = convolve_same(&targ.side, &side_fir);

    // Filtering shifts loudness; re-match it against the fixed reference
    // descriptor over a few clipped passes.
    for step in 0..config.rms_correction_steps {
        for s in mid.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
        let profile = analyze_loudness(&mid, targ_plan);
        if profile.match_rms == 0.0 {
            return Err(DspError::SilentTrack(
                "filtered target collapsed to silence".into(),
            ));
        }
        let correction = ref_profile.match_rms / profile.match_rms;
        debug!("Loudness correction step {}: {:.6}", step + 1, correction);
        scale(&mut mid, correction);
        scale(&mut side, correction);
    }

    Ok(MidSide {
        sample_rate: CANONICAL_SAMPLE_RATE,
        mid,
        side,
    }
    .into_stereo())
}

/// Build one channel's matching FIR from loudest-piece buffers
fn design_fir(
    target_pieces: &[&[f32]],
    reference_pieces: &[&[f32]],
    config: &MatchConfig,
) -> Result<Vec<f32>> {
    let target_spectrum = spectrum::average_spectrum(target_pieces, config.fft_size)?;
    let reference_spectrum = spectrum::average_spectrum(reference_pieces, config.fft_size)?;
    let curve = spectrum::matching_curve(&target_spectrum, &reference_spectrum, config.min_value);

    let linear = spectrum::linear_grid(CANONICAL_SAMPLE_RATE, config.fft_size);
    let log = spectrum::log_grid(CANONICAL_SAMPLE_RATE, config.fft_size, config.oversampling);

    let log_curve = cubic_interp(&linear, &curve, &log);
    let smoothed_log = lowess(&log_curve, config.lowess_frac);
    let mut smoothed = cubic_interp(&log, &smoothed_log, &linear);

    // The log grid starts above the first two linear bins; pin them
    // rather than trusting extrapolated values there.
    smoothed[0] = 0.0;
    smoothed[1] = curve[1];

    Ok(spectrum::fir_from_curve(&smoothed))
}

fn scale(samples: &mut [f32], factor: f64) {
    for s in samples.iter_mut() {
        *s = (*s as f64 * factor) as f32;
    }
}
