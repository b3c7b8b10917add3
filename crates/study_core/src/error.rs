use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes shared by the core, the RAG crate and the CLI.
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const SOURCE_NOT_FOUND: &str = "SOURCE_NOT_FOUND";
    pub const SOURCE_READ_FAILED: &str = "SOURCE_READ_FAILED";
    pub const INDEX_DIMENSION_MISMATCH: &str = "INDEX_DIMENSION_MISMATCH";
    pub const INDEX_TABLE_NOT_FOUND: &str = "INDEX_TABLE_NOT_FOUND";
    pub const INDEX_STORE_FAILED: &str = "INDEX_STORE_FAILED";
    pub const AI_OLLAMA_URL_INVALID: &str = "AI_OLLAMA_URL_INVALID";
    pub const AI_OLLAMA_UNREACHABLE: &str = "AI_OLLAMA_UNREACHABLE";
    pub const AI_EMBEDDINGS_FAILED: &str = "AI_EMBEDDINGS_FAILED";
    pub const AI_RETRIEVAL_FAILED: &str = "AI_RETRIEVAL_FAILED";
    pub const AI_GENERATION_FAILED: &str = "AI_GENERATION_FAILED";
    pub const AI_GENERATE_OPTION_REJECTED: &str = "AI_GENERATE_OPTION_REJECTED";
    pub const AI_EXTRACTION_EMPTY: &str = "AI_EXTRACTION_EMPTY";
    pub const OUTPUT_WRITE_FAILED: &str = "OUTPUT_WRITE_FAILED";
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const JOB_STATUS_INVALID: &str = "JOB_STATUS_INVALID";
    pub const JOB_NOT_FOUND: &str = "JOB_NOT_FOUND";
    pub const JOB_FAILED: &str = "JOB_FAILED";
    pub const DB_OPEN_FAILED: &str = "DB_OPEN_FAILED";
    pub const DB_MIGRATION_FAILED: &str = "DB_MIGRATION_FAILED";
    pub const DB_QUERY_FAILED: &str = "DB_QUERY_FAILED";
}

/// Single structured error shape used across the pipeline layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(codes::CONFIG_INVALID, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = self.details.as_deref() {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
