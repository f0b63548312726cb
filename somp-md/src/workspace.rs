//! Track acquisition into per-job working directories
//!
//! Tracks arrive either by filesystem copy (`local` deployment) or by HTTP
//! download (`remote` deployment). Acquired files keep the locator's
//! extension and are named `<role>_<jobId>.<ext>` inside the job directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DeploymentMode;
use crate::error::{Error, Result};

/// Extension of a track locator (path or URL), defaulting to `wav`.
///
/// Query strings and fragments are stripped before looking at the final
/// path segment.
pub fn extension_of(locator: &str) -> &str {
    let trimmed = locator.split(['?', '#']).next().unwrap_or("");
    let name = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "wav",
    }
}

/// Bring a track into the job directory as `<role>_<id>.<ext>`.
pub async fn acquire(
    client: &reqwest::Client,
    mode: DeploymentMode,
    locator: &str,
    dir: &Path,
    role: &str,
    id: &str,
) -> Result<PathBuf> {
    let dest = dir.join(format!("{}_{}.{}", role, id, extension_of(locator)));

    match mode {
        DeploymentMode::Local => {
            tokio::fs::copy(locator, &dest)
                .await
                .map_err(|e| Error::Copy(format!("{}: {}", locator, e)))?;
        }
        DeploymentMode::Remote => {
            let response = client
                .get(locator)
                .send()
                .await
                .map_err(|e| Error::Download(format!("{}: {}", locator, e)))?;

            if response.status().as_u16() != 200 {
                return Err(Error::Download(format!(
                    "HTTP status {} from {}",
                    response.status(),
                    locator
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Download(format!("{}: {}", locator, e)))?;

            tokio::fs::write(&dest, &bytes)
                .await
                .map_err(|e| Error::Download(format!("{}: {}", dest.display(), e)))?;
        }
    }

    debug!("Acquired {} as {}", locator, dest.display());
    Ok(dest)
}
