use serde::{Deserialize, Serialize};
use study_core::error::AppError;
use tracing::{debug, info};

use super::chunking::chunk_words;
use super::source::TextSource;
use super::table::VectorTable;
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    pub characters: usize,
    pub chunk_count: usize,
    pub table: String,
    pub created: bool,
}

/// Read, chunk, embed and store one document.
///
/// The window is validated before the source is read. A single failed embedding aborts the
/// ingest before anything is written, so the table never holds a partial document.
pub fn ingest_source(
    source: &dyn TextSource,
    table: &VectorTable,
    embedder: &dyn Embedder,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<IngestReport, AppError> {
    study_core::config::validate_window(chunk_size, chunk_overlap)?;

    let text = source.read_text()?;
    let characters = text.chars().count();
    info!(source = source.label(), characters, "read source text");

    let chunks = chunk_words(&text, chunk_size, chunk_overlap, source.label())?;
    info!(chunks = chunks.len(), chunk_size, chunk_overlap, "chunked source text");

    let mut embeddings = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        embeddings.push(embedder.embed(&chunk.text)?);
        if (i + 1) % 10 == 0 || i + 1 == chunks.len() {
            debug!(done = i + 1, total = chunks.len(), model = embedder.model(), "embedded chunks");
        }
    }

    let report = table.store(&chunks, &embeddings)?;

    Ok(IngestReport {
        source: source.label().to_string(),
        characters,
        chunk_count: chunks.len(),
        table: report.table_name,
        created: report.created,
    })
}
