//! Submission queue
//!
//! Unbounded channel between the HTTP submission path and the manager's
//! dispatch loop. The sender side is shared; the receiver is taken exactly
//! once by the loop.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{Error, Result};

use super::job::Job;

pub struct JobQueue {
    tx: mpsc::UnboundedSender<Arc<Job>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Arc<Job>>>>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Enqueue a job for the dispatch loop.
    pub fn push(&self, job: Arc<Job>) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|_| Error::Job("Job queue is closed".to_string()))
    }

    /// Take the consumer end. Returns `None` on every call after the first.
    pub fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<Arc<Job>>> {
        self.rx.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_then_receive() {
        let root = tempfile::tempdir().unwrap();
        let queue = JobQueue::new();
        let job = Arc::new(Job::new(Vec::new(), root.path()).unwrap());

        queue.push(job.clone()).unwrap();

        let mut rx = queue.take_receiver().unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, job.id);
    }

    #[test]
    fn test_receiver_taken_once() {
        let queue = JobQueue::new();
        assert!(queue.take_receiver().is_some());
        assert!(queue.take_receiver().is_none());
    }
}
