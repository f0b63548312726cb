//! Job state and the stage execution loop
//!
//! A job owns its working directory, its stage schedule, and a
//! status/comment pair readable while it runs. Stages execute strictly in
//! order; the first failure flips the job to `Error` with a diagnostic
//! comment and skips everything after it, including the callback.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::callback;
use crate::error::{Error, Result};
use crate::processing;
use crate::workspace;

use super::manager::JobContext;
use super::stages::StageDescriptor;

/// Lifecycle states of a mastering job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Created,
    Downloaded,
    Equalized,
    Compressed,
    Normalized,
    Mastered,
    Done,
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Created => "Created",
            JobStatus::Downloaded => "Downloaded",
            JobStatus::Equalized => "Equalized",
            JobStatus::Compressed => "Compressed",
            JobStatus::Normalized => "Normalized",
            JobStatus::Mastered => "Mastered",
            JobStatus::Done => "Done",
            JobStatus::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Paths produced so far while a job runs
#[derive(Debug, Default)]
struct RunState {
    target: PathBuf,
    reference: Option<PathBuf>,
    /// Output of the most recent stage, input to the next
    last: PathBuf,
}

/// A single mastering job
pub struct Job {
    pub id: Uuid,
    pub stages: Vec<StageDescriptor>,
    /// Per-job working directory
    pub workspace: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Reserved for cancelling in-flight work; nothing observes it yet
    pub cancel: CancellationToken,
    status: RwLock<JobStatus>,
    comment: RwLock<String>,
}

impl Job {
    /// Create a job and its working directory under `workspace_root`.
    pub fn new(stages: Vec<StageDescriptor>, workspace_root: &std::path::Path) -> Result<Self> {
        let id = Uuid::new_v4();
        let workspace = workspace_root.join(id.simple().to_string());
        std::fs::create_dir_all(&workspace)?;

        let schedule: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        info!(job_id = %id.simple(), "Schedule: {}", schedule.join(", "));

        Ok(Self {
            id,
            stages,
            workspace,
            created_at: Utc::now(),
            cancel: CancellationToken::new(),
            status: RwLock::new(JobStatus::Created),
            comment: RwLock::new(String::from("Success")),
        })
    }

    /// Current status
    pub async fn status(&self) -> JobStatus {
        *self.status.read().await
    }

    /// Current comment (diagnostic after a failure, `Success` otherwise)
    pub async fn comment(&self) -> String {
        self.comment.read().await.clone()
    }

    async fn advance(&self, status: JobStatus) {
        *self.status.write().await = status;
        info!(job_id = %self.id.simple(), "Changed status to \"{}\"", status);
    }

    /// Mark the job failed with a diagnostic comment.
    pub async fn fail(&self, comment: String) {
        *self.status.write().await = JobStatus::Error;
        info!(job_id = %self.id.simple(), "Changed status to \"Error\": {}", comment);
        *self.comment.write().await = comment;
    }

    /// Run every scheduled stage in order, stopping at the first failure.
    pub async fn run(&self, ctx: &JobContext) {
        let mut state = RunState::default();
        for stage in &self.stages {
            debug!(job_id = %self.id.simple(), "Start \"{}\" stage", stage.name());
            match self.run_stage(stage, &mut state, ctx).await {
                Ok(()) => self.advance(stage.end_status()).await,
                Err(e) => {
                    self.fail(e.to_string()).await;
                    return;
                }
            }
        }
        info!(job_id = %self.id.simple(), "Job is done");
    }

    async fn run_stage(
        &self,
        stage: &StageDescriptor,
        state: &mut RunState,
        ctx: &JobContext,
    ) -> Result<()> {
        let id = self.id.simple().to_string();

        match stage {
            StageDescriptor::Download { target, reference } => {
                state.target = workspace::acquire(
                    &ctx.client,
                    ctx.config.location,
                    target,
                    &self.workspace,
                    "targ",
                    &id,
                )
                .await?;

                if let Some(reference) = reference {
                    state.reference = Some(
                        workspace::acquire(
                            &ctx.client,
                            ctx.config.location,
                            reference,
                            &self.workspace,
                            "ref",
                            &id,
                        )
                        .await?,
                    );
                }

                state.last = state.target.clone();
            }

            StageDescriptor::Equalize { bands } => {
                let input = state.last.clone();
                let dir = self.workspace.clone();
                let bands = bands.clone();
                state.last = ctx
                    .run_dsp(move || processing::equalize_file(&input, &dir, &id, &bands))
                    .await?;
            }

            StageDescriptor::Compress(params) => {
                let input = state.last.clone();
                let dir = self.workspace.clone();
                let params = *params;
                state.last = ctx
                    .run_dsp(move || processing::compress_file(&input, &dir, &id, &params))
                    .await?;
            }

            StageDescriptor::Normalize { target_level } => {
                let input = state.last.clone();
                let dir = self.workspace.clone();
                let target_level = *target_level;
                state.last = ctx
                    .run_dsp(move || processing::normalize_file(&input, &dir, &id, target_level))
                    .await?;
            }

            StageDescriptor::Reference => {
                let target = state.last.clone();
                let reference = state.reference.clone().ok_or_else(|| {
                    Error::Job("Reference stage scheduled without a reference track".to_string())
                })?;
                let dir = self.workspace.clone();
                state.last = ctx
                    .run_dsp(move || processing::master_file(&target, &reference, &dir, &id))
                    .await?;
            }

            StageDescriptor::Final { callback: url } => {
                if state.last.as_os_str().is_empty() {
                    return Err(Error::Job("No artifact to deliver".to_string()));
                }
                callback::deliver(&ctx.client, ctx.config.location, url, &state.last).await?;
            }
        }

        Ok(())
    }
}
