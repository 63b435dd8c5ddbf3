pub mod artifact;
pub mod chunk;
pub mod error;
pub mod job;
pub mod report;
pub mod task;

pub use artifact::{Artifact, ParamState};
pub use chunk::ChunkDescriptor;
pub use error::CoordError;
pub use job::{Job, JobStatus, JobView, SubmitRequest, SubmitResponse, CHUNK_RETRY_EXHAUSTED};
pub use report::{report_id, ReportOutcome, WorkerReport};
pub use task::{ReportAck, TaskMessage, TaskPollResponse};

pub type JobId = String;
pub type ReportId = String;
