//! Job model, queueing, and execution

pub mod job;
pub mod manager;
pub mod queue;
pub mod stages;

pub use job::{Job, JobStatus};
pub use manager::{JobContext, JobManager};
pub use queue::JobQueue;
pub use stages::StageDescriptor;
