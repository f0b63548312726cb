//! Stage plan model
//!
//! A job is an ordered list of stage descriptors built at submission time.
//! Acquisition always comes first and callback delivery always comes last;
//! in between sit either the shallow effects or a single reference
//! mastering stage.

use somp_dsp::effects::{CompressorParams, EqBand};

use super::job::JobStatus;

/// One scheduled stage of a mastering job
#[derive(Debug, Clone)]
pub enum StageDescriptor {
    /// Bring the target (and reference, when scheduled) into the workspace
    Download {
        target: String,
        reference: Option<String>,
    },
    /// Cascade of peaking filters
    Equalize { bands: Vec<EqBand> },
    /// Downward compression
    Compress(CompressorParams),
    /// Peak normalization to a dBFS level
    Normalize { target_level: f32 },
    /// Loudness and spectral matching against the reference track
    Reference,
    /// Deliver the result to the callback URL
    Final { callback: String },
}

impl StageDescriptor {
    /// Name used in schedule logs
    pub fn name(&self) -> &'static str {
        match self {
            StageDescriptor::Download { .. } => "download",
            StageDescriptor::Equalize { .. } => "equalize",
            StageDescriptor::Compress(_) => "compress",
            StageDescriptor::Normalize { .. } => "normalize",
            StageDescriptor::Reference => "reference",
            StageDescriptor::Final { .. } => "final",
        }
    }

    /// Status the job reports once this stage completes
    pub fn end_status(&self) -> JobStatus {
        match self {
            StageDescriptor::Download { .. } => JobStatus::Downloaded,
            StageDescriptor::Equalize { .. } => JobStatus::Equalized,
            StageDescriptor::Compress(_) => JobStatus::Compressed,
            StageDescriptor::Normalize { .. } => JobStatus::Normalized,
            StageDescriptor::Reference => JobStatus::Mastered,
            StageDescriptor::Final { .. } => JobStatus::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_status_mapping() {
        let download = StageDescriptor::Download {
            target: "a.wav".to_string(),
            reference: None,
        };
        assert_eq!(download.end_status(), JobStatus::Downloaded);
        assert_eq!(StageDescriptor::Reference.end_status(), JobStatus::Mastered);

        let last = StageDescriptor::Final {
            callback: "http://example/cb".to_string(),
        };
        assert_eq!(last.end_status(), JobStatus::Done);
        assert_eq!(last.name(), "final");
    }
}
