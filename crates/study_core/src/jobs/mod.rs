use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{codes, AppError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Reading,
    Flashcards,
    Quizzes,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Reading,
        JobStatus::Flashcards,
        JobStatus::Quizzes,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Reading => "reading",
            JobStatus::Flashcards => "flashcards",
            JobStatus::Quizzes => "quizzes",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                AppError::new(codes::JOB_STATUS_INVALID, "Invalid job status")
                    .with_details(format!("status={s}"))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub document_id: String,
    pub email: Option<String>,
}

/// Receives job lifecycle transitions emitted by the pipeline.
pub trait JobStatusSink {
    fn add_job(&self, record: &JobRecord) -> Result<(), AppError>;
    fn update_status(&self, job_id: &str, status: JobStatus) -> Result<(), AppError>;
}

pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Wrap a connection that has already been migrated.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, job_id: &str) -> Result<JobRecord, AppError> {
        let row = self
            .conn
            .query_row(
                "SELECT job_id, status, document_id, email FROM jobs WHERE job_id = ?1",
                [job_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| {
                AppError::new(codes::DB_QUERY_FAILED, "Failed to read job")
                    .with_details(e.to_string())
            })?;
        let Some((job_id, status, document_id, email)) = row else {
            return Err(AppError::new(codes::JOB_NOT_FOUND, "Job not found")
                .with_details(format!("job_id={job_id}")));
        };
        Ok(JobRecord {
            job_id,
            status: status.parse()?,
            document_id,
            email,
        })
    }
}

impl JobStatusSink for SqliteJobStore {
    fn add_job(&self, record: &JobRecord) -> Result<(), AppError> {
        self.conn
            .execute(
                "INSERT INTO jobs(job_id, status, document_id, email, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ','now'), strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
                params![
                    record.job_id,
                    record.status.as_str(),
                    record.document_id,
                    record.email
                ],
            )
            .map_err(|e| {
                AppError::new(codes::DB_QUERY_FAILED, "Failed to add job")
                    .with_details(format!("job_id={}; err={}", record.job_id, e))
            })?;
        info!(job_id = %record.job_id, status = %record.status, "job added");
        Ok(())
    }

    fn update_status(&self, job_id: &str, status: JobStatus) -> Result<(), AppError> {
        let changed = self
            .conn
            .execute(
                "UPDATE jobs SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now') WHERE job_id = ?2",
                params![status.as_str(), job_id],
            )
            .map_err(|e| {
                AppError::new(codes::DB_QUERY_FAILED, "Failed to update job status")
                    .with_details(format!("job_id={job_id}; err={e}"))
            })?;
        if changed == 0 {
            return Err(AppError::new(codes::JOB_NOT_FOUND, "Job not found")
                .with_details(format!("job_id={job_id}")));
        }
        info!(job_id = %job_id, status = %status, "job status updated");
        Ok(())
    }
}
