//! Document corpus: chunking, the on-disk vector table and ingest.

pub mod chunking;
pub mod ingest;
pub mod model;
pub mod source;
pub mod table;

mod similarity;

pub use chunking::chunk_words;
pub use ingest::{ingest_source, IngestReport};
pub use model::{Chunk, SearchHit, StoreReport, TableRow, TableSchema};
pub use source::{PlainTextFile, TextSource};
pub use table::VectorTable;
