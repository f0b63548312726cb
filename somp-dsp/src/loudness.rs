//! Piecewise loudness analysis
//!
//! Splits a channel into contiguous equal-length pieces (nominally 15 s at
//! the canonical rate, last piece may be shorter), computes per-piece RMS,
//! selects the above-average "loudest" pieces, and reduces them to a single
//! match RMS used as the loudness descriptor when matching two signals.

/// Division of a sample buffer into contiguous, non-overlapping pieces
///
/// `count` is `len / nominal_piece_len + 1`, so a trailing partial piece
/// always exists and every sample lands in exactly one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiecePlan {
    /// Total samples covered
    pub len: usize,
    /// Number of pieces
    pub count: usize,
    /// Samples per piece; the final piece keeps the remainder
    pub piece_len: usize,
}

impl PiecePlan {
    /// Plan a division of `len` samples into pieces of at most
    /// `nominal_piece_len` samples.
    pub fn new(len: usize, nominal_piece_len: usize) -> Self {
        let count = len / nominal_piece_len.max(1) + 1;
        let piece_len = len.div_ceil(count);
        Self {
            len,
            count,
            piece_len,
        }
    }

    /// Iterate the pieces of `samples` under this plan
    pub fn pieces<'a>(&self, samples: &'a [f32]) -> impl Iterator<Item = &'a [f32]> {
        samples.chunks(self.piece_len.max(1))
    }
}

/// RMS of a sample buffer (f64 accumulation)
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum / samples.len() as f64).sqrt()
}

/// RMS over a set of RMS values
fn rms_of_values(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| v * v).sum();
    (sum / values.len() as f64).sqrt()
}

/// Loudness profile of a single channel under a piece plan
#[derive(Debug, Clone)]
pub struct LoudnessProfile {
    /// The division the profile was computed under
    pub plan: PiecePlan,
    /// RMS per piece, in piece order
    pub piece_rms: Vec<f64>,
    /// Mean of `piece_rms`
    pub average_rms: f64,
    /// Indexes of pieces with RMS >= average
    pub loudest: Vec<usize>,
    /// RMS of the loudest pieces' RMS values
    pub match_rms: f64,
}

impl LoudnessProfile {
    /// Slice the loudest pieces out of `samples`
    ///
    /// `samples` may be a different channel than the one analyzed (side
    /// pieces are selected by the mid channel's loudness), but must have
    /// the same length.
    pub fn loudest_pieces<'a>(&self, samples: &'a [f32]) -> Vec<&'a [f32]> {
        let pieces: Vec<&[f32]> = self.plan.pieces(samples).collect();
        self.loudest
            .iter()
            .filter_map(|&i| pieces.get(i).copied())
            .collect()
    }
}

/// Compute the loudness profile of `samples` under `plan`
pub fn analyze_loudness(samples: &[f32], plan: PiecePlan) -> LoudnessProfile {
    let piece_rms: Vec<f64> = plan.pieces(samples).map(rms).collect();
    let average_rms = if piece_rms.is_empty() {
        0.0
    } else {
        piece_rms.iter().sum::<f64>() / piece_rms.len() as f64
    };

    let loudest: Vec<usize> = piece_rms
        .iter()
        .enumerate()
        .filter(|(_, r)| **r >= average_rms)
        .map(|(i, _)| i)
        .collect();

    let selected: Vec<f64> = loudest.iter().map(|&i| piece_rms[i]).collect();
    let match_rms = rms_of_values(&selected);

    LoudnessProfile {
        plan,
        piece_rms,
        average_rms,
        loudest,
        match_rms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_piece_plan_formula() {
        // 10 samples, nominal 4: 10/4 + 1 = 3 pieces of ceil(10/3) = 4
        let plan = PiecePlan::new(10, 4);
        assert_eq!(plan.count, 3);
        assert_eq!(plan.piece_len, 4);
    }

    #[test]
    fn test_piece_plan_short_input() {
        // Shorter than one nominal piece still yields one piece
        let plan = PiecePlan::new(3, 100);
        assert_eq!(plan.count, 1);
        assert_eq!(plan.piece_len, 3);
    }

    #[test]
    fn test_pieces_tile_exactly() {
        let samples = vec![0.0f32; 10];
        let plan = PiecePlan::new(samples.len(), 4);
        let lens: Vec<usize> = plan.pieces(&samples).map(|p| p.len()).collect();

        assert_eq!(lens, vec![4, 4, 2]);
        assert_eq!(lens.iter().sum::<usize>(), samples.len());
        assert!(lens.iter().all(|&l| l > 0 && l <= 4));
    }

    #[test]
    fn test_pieces_tile_realistic_lengths() {
        // 30 s and 37 s at 44100 Hz against the 15 s nominal piece
        let nominal = 15 * 44100;
        for len in [30 * 44100, 37 * 44100 + 123] {
            let plan = PiecePlan::new(len, nominal);
            assert_eq!(plan.count, len / nominal + 1);

            let samples = vec![0.0f32; len];
            let lens: Vec<usize> = plan.pieces(&samples).map(|p| p.len()).collect();
            assert_eq!(lens.len(), plan.count);
            assert_eq!(lens.iter().sum::<usize>(), len);
            assert!(lens.iter().all(|&l| l > 0 && l <= nominal));
        }
    }

    #[test]
    fn test_rms() {
        assert_abs_diff_eq!(rms(&[0.5, 0.5, 0.5, 0.5]), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(rms(&[1.0, -1.0]), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rms(&[]), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loudest_selection() {
        // Two quiet pieces (0.1), two loud pieces (0.5); nominal piece 2
        let samples = vec![0.1, 0.1, 0.5, 0.5, 0.1, 0.1, 0.5];
        let plan = PiecePlan::new(samples.len(), 2);
        let profile = analyze_loudness(&samples, plan);

        assert_eq!(profile.piece_rms.len(), plan.count);
        // average is 0.3, loud pieces are those at 0.5
        assert_eq!(profile.loudest, vec![1, 3]);
        assert_abs_diff_eq!(profile.match_rms, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_signal_selects_everything() {
        let samples = vec![0.25f32; 12];
        let plan = PiecePlan::new(samples.len(), 4);
        let profile = analyze_loudness(&samples, plan);

        assert_eq!(profile.loudest.len(), plan.count);
        assert_abs_diff_eq!(profile.match_rms, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_silent_signal_zero_match_rms() {
        let samples = vec![0.0f32; 8];
        let plan = PiecePlan::new(samples.len(), 4);
        let profile = analyze_loudness(&samples, plan);
        assert_eq!(profile.match_rms, 0.0);
    }

    #[test]
    fn test_loudest_pieces_follow_mid_selection() {
        let mid = vec![0.0, 0.0, 0.9, 0.9];
        let side = vec![1.0, 2.0, 3.0, 4.0];
        let plan = PiecePlan::new(mid.len(), 2);
        let profile = analyze_loudness(&mid, plan);

        let side_pieces = profile.loudest_pieces(&side);
        assert_eq!(side_pieces, vec![&[3.0f32, 4.0f32][..]]);
    }
}
