mod job;
mod state;

pub use job::{Job, JobResult};
pub use state::{JobStatus, Stage};
