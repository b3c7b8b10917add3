//! Run configuration, read once at startup and passed into constructors.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const DEFAULT_FLASHCARD_QUERIES: [&str; 4] = [
    "What are the main concepts and topics covered?",
    "What are the key definitions and terms?",
    "What are the important facts and information?",
    "What are the relationships and connections between ideas?",
];

pub const DEFAULT_QUIZ_QUERY: &str =
    "Create a comprehensive quiz covering all major topics and concepts";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_path: PathBuf,
    pub ollama_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub db_path: PathBuf,
    pub table_name: String,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks retrieved per query.
    pub k_chunks: usize,
    pub flashcards_per_chunk: usize,
    pub quiz_questions: usize,
    pub use_cuda: bool,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub flashcard_queries: Vec<String>,
    pub quiz_query: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("Tests/test.txt"),
            ollama_url: "http://127.0.0.1:11434".to_string(),
            embedding_model: "mxbai-embed-large:latest".to_string(),
            generation_model: "llama3:8b".to_string(),
            db_path: PathBuf::from("./chunks-storage"),
            table_name: "book_chunks".to_string(),
            chunk_size: 400,
            chunk_overlap: 80,
            k_chunks: 3,
            flashcards_per_chunk: 5,
            quiz_questions: 10,
            use_cuda: false,
            request_timeout_secs: 120,
            output_dir: PathBuf::from("output"),
            flashcard_queries: DEFAULT_FLASHCARD_QUERIES
                .iter()
                .map(|q| q.to_string())
                .collect(),
            quiz_query: DEFAULT_QUIZ_QUERY.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| {
            AppError::config("Failed to parse configuration").with_details(e.to_string())
        })
    }

    /// Read configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::config("Failed to read configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_window(self.chunk_size, self.chunk_overlap)?;
        if self.k_chunks == 0 {
            return Err(AppError::config("k_chunks must be at least 1"));
        }
        for (field, value) in [
            ("ollama_url", self.ollama_url.as_str()),
            ("embedding_model", self.embedding_model.as_str()),
            ("generation_model", self.generation_model.as_str()),
            ("table_name", self.table_name.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::config(format!("{field} is required")));
            }
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::config("db_path is required"));
        }
        if self.flashcard_queries.iter().all(|q| q.trim().is_empty()) {
            return Err(AppError::config("at least one flashcard query is required"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::config("request_timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Hardware hint forwarded to the generation backend.
    pub fn device(&self) -> Option<&'static str> {
        if self.use_cuda {
            Some("cuda")
        } else {
            None
        }
    }
}

/// Window advancement is `size - overlap`; anything non-positive would never terminate.
pub fn validate_window(size: usize, overlap: usize) -> Result<(), AppError> {
    if size == 0 || overlap >= size {
        return Err(AppError::new(
            codes::CONFIG_INVALID,
            "chunk window must satisfy size > overlap >= 0",
        )
        .with_details(format!("size={size}; overlap={overlap}")));
    }
    Ok(())
}
