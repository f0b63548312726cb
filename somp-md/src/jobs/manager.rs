//! Job registration and the dispatch loop
//!
//! The manager owns the job table and the submission queue. Jobs are
//! registered in the table at submission time, so a freshly returned id
//! can always be polled. The dispatch loop pulls queued jobs and runs
//! each on its own task; a crash in one job never touches its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};

use super::job::{Job, JobStatus};
use super::queue::JobQueue;
use super::stages::StageDescriptor;

/// Shared resources each running job borrows
#[derive(Clone)]
pub struct JobContext {
    pub config: Config,
    pub client: reqwest::Client,
    /// Bounds how many jobs run signal processing at once
    pub dsp_gate: Arc<Semaphore>,
}

impl JobContext {
    /// Run CPU-bound work on the blocking pool, gated by the DSP semaphore.
    pub async fn run_dsp<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .dsp_gate
            .acquire()
            .await
            .map_err(|_| Error::Job("DSP worker pool is closed".to_string()))?;

        tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| Error::Job(format!("DSP worker crashed: {}", e)))?
    }
}

pub struct JobManager {
    ctx: JobContext,
    jobs: RwLock<HashMap<Uuid, Arc<Job>>>,
    queue: JobQueue,
}

impl JobManager {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("Cannot build HTTP client: {}", e)))?;

        let dsp_gate = Arc::new(Semaphore::new(config.dsp_workers));

        Ok(Self {
            ctx: JobContext {
                config,
                client,
                dsp_gate,
            },
            jobs: RwLock::new(HashMap::new()),
            queue: JobQueue::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Register a new job and queue it for execution.
    ///
    /// The job is visible to status lookups before this returns.
    pub async fn submit(&self, stages: Vec<StageDescriptor>) -> Result<Uuid> {
        let job = Arc::new(Job::new(stages, &self.ctx.config.workspace)?);
        let id = job.id;

        self.jobs.write().await.insert(id, job.clone());
        self.queue.push(job)?;

        Ok(id)
    }

    /// Status of a job, or `None` for an unknown id.
    pub async fn status(&self, id: &Uuid) -> Option<JobStatus> {
        let job = self.jobs.read().await.get(id).cloned();
        match job {
            Some(job) => Some(job.status().await),
            None => None,
        }
    }

    /// Status and comment snapshot, mainly for diagnostics.
    pub async fn inspect(&self, id: &Uuid) -> Option<(JobStatus, String)> {
        let job = self.jobs.read().await.get(id).cloned();
        match job {
            Some(job) => Some((job.status().await, job.comment().await)),
            None => None,
        }
    }

    /// Dispatch loop: pull queued jobs and run each on its own task.
    ///
    /// Consumes the queue receiver; calling this a second time is an error.
    pub async fn run(&self) -> Result<()> {
        let mut rx = self
            .queue
            .take_receiver()
            .ok_or_else(|| Error::Job("Dispatch loop is already running".to_string()))?;

        info!("Job manager running");

        while let Some(job) = rx.recv().await {
            let ctx = self.ctx.clone();
            let supervised = job.clone();

            let worker = tokio::spawn(async move { job.run(&ctx).await });

            tokio::spawn(async move {
                if let Err(e) = worker.await {
                    error!(job_id = %supervised.id.simple(), "Job worker crashed: {}", e);
                    supervised
                        .fail(format!("Internal worker failure: {}", e))
                        .await;
                }
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploymentMode;

    fn test_config(workspace: &std::path::Path) -> Config {
        Config {
            port: 0,
            workspace: workspace.to_path_buf(),
            location: DeploymentMode::Local,
            dsp_workers: 2,
        }
    }

    #[tokio::test]
    async fn test_submitted_job_is_immediately_visible() {
        let root = tempfile::tempdir().unwrap();
        let manager = JobManager::new(test_config(root.path())).unwrap();

        let id = manager.submit(Vec::new()).await.unwrap();
        assert_eq!(manager.status(&id).await, Some(JobStatus::Created));
    }

    #[tokio::test]
    async fn test_unknown_id_has_no_status() {
        let root = tempfile::tempdir().unwrap();
        let manager = JobManager::new(test_config(root.path())).unwrap();

        assert_eq!(manager.status(&Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn test_failed_download_flips_job_to_error() {
        let root = tempfile::tempdir().unwrap();
        let manager = Arc::new(JobManager::new(test_config(root.path())).unwrap());

        let runner = manager.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });

        let stages = vec![
            StageDescriptor::Download {
                target: "/nonexistent/input.wav".to_string(),
                reference: None,
            },
            StageDescriptor::Final {
                callback: "http://127.0.0.1:1/callback".to_string(),
            },
        ];
        let id = manager.submit(stages).await.unwrap();

        let mut last = None;
        for _ in 0..100 {
            last = manager.status(&id).await;
            if last == Some(JobStatus::Error) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(last, Some(JobStatus::Error));

        let (_, comment) = manager.inspect(&id).await.unwrap();
        assert!(comment.contains("copying"), "comment: {}", comment);
    }
}
