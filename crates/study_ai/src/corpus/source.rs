use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use study_core::error::{codes, AppError};

/// Yields the full extracted text of one document.
pub trait TextSource {
    /// Recorded as the `source` column of every chunk taken from this document.
    fn label(&self) -> &str;
    fn read_text(&self) -> Result<String, AppError>;
}

/// A UTF-8 text file already extracted from its original format.
#[derive(Debug, Clone)]
pub struct PlainTextFile {
    path: PathBuf,
    label: String,
}

impl PlainTextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }
}

impl TextSource for PlainTextFile {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_text(&self) -> Result<String, AppError> {
        fs::read_to_string(&self.path).map_err(|e| {
            let code = if e.kind() == ErrorKind::NotFound {
                codes::SOURCE_NOT_FOUND
            } else {
                codes::SOURCE_READ_FAILED
            };
            AppError::new(code, "Failed to read source document")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })
    }
}
