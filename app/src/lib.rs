pub mod jobs;
pub mod pipeline;

pub use jobs::{run_job, JobOutcome, JobRequest};
pub use pipeline::StudyPipeline;
