//! Completion callback delivery
//!
//! When a job finishes, its result is pushed to the callback URL supplied
//! at submission. `local` deployments send the artifact's path as the
//! request body; `remote` deployments send the file bytes.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::DeploymentMode;
use crate::error::{Error, Result};

/// Hard deadline on the callback request. Failures are terminal; there is
/// no retry.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// POST the finished artifact to the job's callback URL.
pub async fn deliver(
    client: &reqwest::Client,
    mode: DeploymentMode,
    url: &str,
    artifact: &Path,
) -> Result<()> {
    let body: Vec<u8> = match mode {
        DeploymentMode::Local => artifact.to_string_lossy().into_owned().into_bytes(),
        DeploymentMode::Remote => tokio::fs::read(artifact).await.map_err(|e| {
            Error::Callback(format!("Cannot read {}: {}", artifact.display(), e))
        })?,
    };

    debug!("Posting {} byte callback body to {}", body.len(), url);

    let response = client
        .post(url)
        .timeout(CALLBACK_TIMEOUT)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::Callback(format!("{}: {}", url, e)))?;

    if response.status().as_u16() != 200 {
        return Err(Error::Callback(format!(
            "HTTP status {} from {}",
            response.status(),
            url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_callback_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("result.wav");
        std::fs::write(&artifact, b"bytes").unwrap();

        let client = reqwest::Client::new();
        let err = deliver(
            &client,
            DeploymentMode::Local,
            "http://127.0.0.1:1/callback",
            &artifact,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Callback(_)));
    }

    #[tokio::test]
    async fn test_remote_mode_requires_readable_artifact() {
        let client = reqwest::Client::new();
        let err = deliver(
            &client,
            DeploymentMode::Remote,
            "http://127.0.0.1:1/callback",
            Path::new("/nonexistent/result.wav"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Callback(_)));
    }
}
