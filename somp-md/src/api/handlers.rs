//! HTTP request handlers
//!
//! The submission body is parsed by hand from bytes so malformed input
//! answers `400` with a diagnostic naming the problem, mirroring the
//! plain-text contract of the endpoints: job ids and statuses go back as
//! text, not JSON.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use somp_dsp::effects::{CompressorParams, EqBand};
use tracing::{error, info};
use uuid::Uuid;

use crate::jobs::StageDescriptor;

use super::AppContext;

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /startProc`
#[derive(Debug, Deserialize)]
pub struct StartProcRequest {
    #[serde(rename = "targetTrack")]
    pub target_track: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    /// Operation entries, validated individually after the envelope
    #[serde(rename = "masteringOperations")]
    pub mastering_operations: Vec<serde_json::Value>,
}

/// One entry of `masteringOperations`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum Operation {
    Reference(ReferenceParams),
    Equalization(Vec<EqGroup>),
    Compression(CompressionParams),
    Normalization(NormalizationParams),
}

#[derive(Debug, Deserialize)]
pub struct ReferenceParams {
    #[serde(rename = "referenceTrack")]
    pub reference_track: String,
}

/// Gain applied to a group of center frequencies
#[derive(Debug, Deserialize)]
pub struct EqGroup {
    pub frequencies: Vec<f32>,
    /// Boost or cut in dB; omitted means flat
    #[serde(default)]
    pub gain: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompressionParams {
    pub threshold: f32,
    pub ratio: f32,
    pub attack: Option<f32>,
    pub release: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizationParams {
    #[serde(rename = "targetLevel")]
    pub target_level: Option<f32>,
}

// ============================================================================
// Stage Planning
// ============================================================================

/// Translate a submission into an ordered stage schedule.
///
/// A `reference` operation supersedes the shallow effects. Within each
/// operation type the first entry wins; shallow effects always run in
/// equalize, compress, normalize order regardless of how the request
/// ordered them.
fn plan_stages(request: &StartProcRequest, operations: &[Operation]) -> Vec<StageDescriptor> {
    let mut stages = Vec::new();

    let reference = operations.iter().find_map(|op| match op {
        Operation::Reference(params) => Some(params),
        _ => None,
    });

    if let Some(reference) = reference {
        stages.push(StageDescriptor::Download {
            target: request.target_track.clone(),
            reference: Some(reference.reference_track.clone()),
        });
        stages.push(StageDescriptor::Reference);
    } else {
        stages.push(StageDescriptor::Download {
            target: request.target_track.clone(),
            reference: None,
        });

        let equalization = operations.iter().find_map(|op| match op {
            Operation::Equalization(groups) => Some(groups),
            _ => None,
        });
        if let Some(groups) = equalization {
            let bands = groups
                .iter()
                .flat_map(|group| {
                    group.frequencies.iter().map(|&frequency| EqBand {
                        frequency,
                        gain_db: group.gain,
                    })
                })
                .collect();
            stages.push(StageDescriptor::Equalize { bands });
        }

        let compression = operations.iter().find_map(|op| match op {
            Operation::Compression(params) => Some(params),
            _ => None,
        });
        if let Some(params) = compression {
            let mut compressor = CompressorParams {
                threshold_db: params.threshold,
                ratio: params.ratio,
                ..Default::default()
            };
            if let Some(attack) = params.attack {
                compressor.attack_ms = attack;
            }
            if let Some(release) = params.release {
                compressor.release_ms = release;
            }
            stages.push(StageDescriptor::Compress(compressor));
        }

        let normalization = operations.iter().find_map(|op| match op {
            Operation::Normalization(params) => Some(params),
            _ => None,
        });
        if let Some(params) = normalization {
            stages.push(StageDescriptor::Normalize {
                target_level: params.target_level.unwrap_or(0.0),
            });
        }
    }

    stages.push(StageDescriptor::Final {
        callback: request.callback_url.clone(),
    });

    stages
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /startProc
///
/// Answers `200` with the dashless job id, or `400` with a diagnostic.
pub async fn start_proc(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<String, (StatusCode, String)> {
    let parsed: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        error!("JSON load error: {}. Send 400 Bad Request", e);
        (StatusCode::BAD_REQUEST, format!("JSON load error: {}", e))
    })?;

    let request: StartProcRequest = serde_json::from_value(parsed).map_err(|e| {
        error!("JSON is incorrect: {}. Send 400 Bad Request", e);
        (StatusCode::BAD_REQUEST, format!("JSON is incorrect: {}", e))
    })?;

    if request.target_track.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "JSON is incorrect: targetTrack must not be empty".to_string(),
        ));
    }
    if request.callback_url.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "JSON is incorrect: callbackURL must not be empty".to_string(),
        ));
    }

    let mut operations = Vec::with_capacity(request.mastering_operations.len());
    for value in &request.mastering_operations {
        let operation: Operation = serde_json::from_value(value.clone()).map_err(|e| {
            error!("Bad masteringOperations structure: {}. Send 400 Bad Request", e);
            (
                StatusCode::BAD_REQUEST,
                format!("Bad masteringOperations structure: {}", e),
            )
        })?;
        operations.push(operation);
    }

    let stages = plan_stages(&request, &operations);

    match ctx.manager.submit(stages).await {
        Ok(id) => {
            info!("Accepted job {}", id.simple());
            Ok(id.simple().to_string())
        }
        Err(e) => {
            error!("Failed to submit job: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("error: {}", e)))
        }
    }
}

/// GET /getProcInfo/:id
///
/// Answers `200` with the job's status string, or `404` for ids that are
/// unknown or do not parse as job ids.
pub async fn get_proc_info(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            error!("Task Not Found. Send 404 Not Found");
            return Err((StatusCode::NOT_FOUND, "Task Not Found".to_string()));
        }
    };

    match ctx.manager.status(&id).await {
        Some(status) => Ok(status.to_string()),
        None => {
            error!("Task Not Found. Send 404 Not Found");
            Err((StatusCode::NOT_FOUND, "Task Not Found".to_string()))
        }
    }
}

/// POST /test/callback
///
/// Loopback sink for exercising the callback leg of a deployment.
pub async fn test_callback(body: Bytes) -> StatusCode {
    info!("Callback received: {} bytes", body.len());
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_request(operations: &str) -> (StartProcRequest, Vec<Operation>) {
        let body = format!(
            r#"{{
                "targetTrack": "/music/target.wav",
                "callbackURL": "http://example/cb",
                "masteringOperations": {}
            }}"#,
            operations
        );
        let request: StartProcRequest = serde_json::from_str(&body).unwrap();
        let operations = request
            .mastering_operations
            .iter()
            .map(|v| serde_json::from_value(v.clone()).unwrap())
            .collect();
        (request, operations)
    }

    #[test]
    fn test_reference_supersedes_shallow_effects() {
        let (request, operations) = parse_request(
            r#"[
                {"type": "equalization", "params": [{"frequencies": [100], "gain": 3}]},
                {"type": "reference", "params": {"referenceTrack": "/music/ref.wav"}}
            ]"#,
        );

        let stages = plan_stages(&request, &operations);
        assert_eq!(stages.len(), 3);
        assert!(matches!(
            &stages[0],
            StageDescriptor::Download { reference: Some(r), .. } if r == "/music/ref.wav"
        ));
        assert!(matches!(stages[1], StageDescriptor::Reference));
        assert!(matches!(stages[2], StageDescriptor::Final { .. }));
    }

    #[test]
    fn test_shallow_effects_run_in_canonical_order() {
        let (request, operations) = parse_request(
            r#"[
                {"type": "normalization", "params": {"targetLevel": -1.0}},
                {"type": "compression", "params": {"threshold": -20, "ratio": 4}},
                {"type": "equalization", "params": [{"frequencies": [100, 200], "gain": 3}]}
            ]"#,
        );

        let stages = plan_stages(&request, &operations);
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["download", "equalize", "compress", "normalize", "final"]
        );

        match &stages[1] {
            StageDescriptor::Equalize { bands } => {
                assert_eq!(bands.len(), 2);
                assert_eq!(bands[0].frequency, 100.0);
                assert_eq!(bands[0].gain_db, 3.0);
            }
            other => panic!("expected equalize, got {:?}", other),
        }
    }

    #[test]
    fn test_first_operation_of_each_type_wins() {
        let (request, operations) = parse_request(
            r#"[
                {"type": "compression", "params": {"threshold": -10, "ratio": 2}},
                {"type": "compression", "params": {"threshold": -30, "ratio": 8}}
            ]"#,
        );

        let stages = plan_stages(&request, &operations);
        match &stages[1] {
            StageDescriptor::Compress(params) => {
                assert_eq!(params.threshold_db, -10.0);
                assert_eq!(params.ratio, 2.0);
            }
            other => panic!("expected compress, got {:?}", other),
        }
    }

    #[test]
    fn test_no_operations_still_downloads_and_delivers() {
        let (request, operations) = parse_request("[]");
        let stages = plan_stages(&request, &operations);
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["download", "final"]);
    }

    #[test]
    fn test_normalization_level_defaults_to_full_scale() {
        let (request, operations) = parse_request(r#"[{"type": "normalization", "params": {}}]"#);
        let stages = plan_stages(&request, &operations);
        assert!(matches!(
            stages[1],
            StageDescriptor::Normalize { target_level } if target_level == 0.0
        ));
    }

    #[test]
    fn test_unknown_operation_type_rejected() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"type": "reverb", "params": {}}"#).unwrap();
        assert!(serde_json::from_value::<Operation>(value).is_err());
    }

    #[test]
    fn test_reference_requires_track() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"type": "reference", "params": {}}"#).unwrap();
        let err = serde_json::from_value::<Operation>(value).unwrap_err();
        assert!(err.to_string().contains("referenceTrack"));
    }

    #[test]
    fn test_equalizer_gain_defaults_flat() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"type": "equalization", "params": [{"frequencies": [440]}]}"#)
                .unwrap();
        let operation: Operation = serde_json::from_value(value).unwrap();
        match operation {
            Operation::Equalization(groups) => assert_eq!(groups[0].gain, 0.0),
            other => panic!("expected equalization, got {:?}", other),
        }
    }
}
