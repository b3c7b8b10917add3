use serde::{Deserialize, Serialize};

/// A window of source words. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: u32,
    pub source: String,
}

/// One persisted row of a vector table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRow {
    pub row_id: u64,
    pub text: String,
    pub vector: Vec<f32>,
    pub source: String,
    pub chunk_index: u32,
    pub text_sha256: String,
}

impl TableRow {
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            text: self.text.clone(),
            index: self.chunk_index,
            source: self.source.clone(),
        }
    }
}

/// Fixed at first write; `dims` never changes for the life of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub dims: u32,
    pub row_count: u64,
    pub next_row_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub row_id: u64,
    pub chunk: Chunk,
    /// Cosine distance (`1 - similarity`); lower is closer.
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreReport {
    pub table_name: String,
    pub rows_written: u64,
    pub created: bool,
    pub dims: Option<u32>,
}
