use std::path::PathBuf;

use serde::Serialize;
use study_ai::corpus::TextSource;
use study_core::artifacts::{remove_artifacts, upload_artifacts, ArtifactStore};
use study_core::error::{codes, AppError};
use study_core::jobs::{JobRecord, JobStatus, JobStatusSink};
use tracing::{error, info, warn};

use crate::pipeline::StudyPipeline;

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: String,
    pub document_id: String,
    pub email: Option<String>,
    pub namespace: String,
    pub include_quiz: bool,
}

impl JobRequest {
    /// Uploads are filed under the requester's email, or the document id without one.
    fn owner(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.document_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    pub flashcards: usize,
    pub quiz_questions: usize,
    pub artifacts: Vec<PathBuf>,
    pub uploaded: Vec<String>,
}

fn job_failed(reason: &str) -> AppError {
    AppError::new(codes::JOB_FAILED, reason)
}

/// Run one document through the pipeline, reporting each stage to `sink`.
///
/// Statuses go pending, reading, flashcards, quizzes, completed. Any error moves the job
/// to failed and is returned. When `store` is given the artifacts are uploaded and the
/// local copies removed.
pub fn run_job(
    pipeline: &StudyPipeline,
    source: &dyn TextSource,
    request: &JobRequest,
    sink: &dyn JobStatusSink,
    store: Option<&dyn ArtifactStore>,
) -> Result<JobOutcome, AppError> {
    sink.add_job(&JobRecord {
        job_id: request.job_id.clone(),
        status: JobStatus::Pending,
        document_id: request.document_id.clone(),
        email: request.email.clone(),
    })?;

    match run_stages(pipeline, source, request, sink, store) {
        Ok(outcome) => {
            info!(job_id = %request.job_id, artifacts = outcome.artifacts.len(), "job completed");
            Ok(outcome)
        }
        Err(e) => {
            error!(job_id = %request.job_id, error = %e, "job failed");
            if let Err(sink_err) = sink.update_status(&request.job_id, JobStatus::Failed) {
                warn!(job_id = %request.job_id, error = %sink_err, "could not record failed status");
            }
            Err(e)
        }
    }
}

fn run_stages(
    pipeline: &StudyPipeline,
    source: &dyn TextSource,
    request: &JobRequest,
    sink: &dyn JobStatusSink,
    store: Option<&dyn ArtifactStore>,
) -> Result<JobOutcome, AppError> {
    let job_id = request.job_id.as_str();

    sink.update_status(job_id, JobStatus::Reading)?;
    pipeline.process_document(source)?;

    sink.update_status(job_id, JobStatus::Flashcards)?;
    let flashcards = pipeline.generate_flashcards();
    if flashcards.cancelled {
        return Err(job_failed("job cancelled"));
    }
    if flashcards.records.is_empty() {
        return Err(job_failed("no flashcards generated"));
    }

    sink.update_status(job_id, JobStatus::Quizzes)?;
    let quiz = if request.include_quiz {
        let run = pipeline.generate_quiz();
        if run.cancelled {
            return Err(job_failed("job cancelled"));
        }
        if run.records.is_empty() {
            warn!(job_id, "no quiz questions generated; continuing with flashcards");
        }
        run.records
    } else {
        Vec::new()
    };

    let artifacts = pipeline.save_outputs(&request.namespace, &flashcards.records, &quiz)?;
    if artifacts.is_empty() {
        return Err(job_failed("no outputs were saved"));
    }

    let uploaded = match store {
        Some(store) => {
            let keys = upload_artifacts(store, request.owner(), &artifacts)?;
            info!(job_id, uploaded = keys.len(), "uploaded artifacts");
            remove_artifacts(&artifacts);
            keys
        }
        None => Vec::new(),
    };

    sink.update_status(job_id, JobStatus::Completed)?;
    Ok(JobOutcome {
        job_id: request.job_id.clone(),
        status: JobStatus::Completed,
        flashcards: flashcards.records.len(),
        quiz_questions: quiz.len(),
        artifacts,
        uploaded,
    })
}
