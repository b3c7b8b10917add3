use study_core::error::{codes, AppError};
use tracing::{debug, warn};

use crate::corpus::VectorTable;
use crate::embeddings::Embedder;

/// Outcome of one retrieval. An empty `chunks` means "no usable context", never an error.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub chunks: Vec<String>,
    pub failure: Option<AppError>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

pub struct Retriever<'a> {
    table: &'a VectorTable,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(table: &'a VectorTable, embedder: &'a dyn Embedder) -> Self {
        Self { table, embedder }
    }

    /// Chunk texts nearest to `query`, closest first. Embedding or search failures are
    /// logged and reported through [`Retrieval::failure`].
    pub fn retrieve(&self, query: &str, k: usize) -> Retrieval {
        match self.try_retrieve(query, k) {
            Ok(chunks) => {
                debug!(table = self.table.name(), k, found = chunks.len(), "retrieved chunks");
                Retrieval {
                    chunks,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(table = self.table.name(), query, error = %e, "retrieval failed; continuing without context");
                Retrieval {
                    chunks: Vec::new(),
                    failure: Some(e),
                }
            }
        }
    }

    fn try_retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new(codes::AI_RETRIEVAL_FAILED, "Query must not be empty"));
        }
        let qv = self.embedder.embed(q).map_err(|e| {
            AppError::new(codes::AI_RETRIEVAL_FAILED, "Failed to embed query")
                .with_details(e.to_string())
                .with_retryable(e.retryable)
        })?;
        let hits = self.table.search(&qv, k).map_err(|e| {
            AppError::new(codes::AI_RETRIEVAL_FAILED, "Vector search failed").with_details(e.to_string())
        })?;
        Ok(hits.into_iter().map(|h| h.chunk.text).collect())
    }
}
