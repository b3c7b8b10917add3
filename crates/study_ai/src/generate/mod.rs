use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use study_core::domain::{Flashcard, QuizQuestion};
use study_core::error::{codes, AppError};
use tracing::{info, warn};

use crate::extract::{extract_records, StudyRecord};
use crate::llm::{generate_with_fallback, GenerateOptions, Llm};
use crate::quota::{per_chunk_target, truncate_to_target};
use crate::retrieve::Retriever;

/// Shared cancellation signal, observed between chunks and never mid-chunk.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    pub chunk: usize,
    pub error: AppError,
}

#[derive(Debug, Clone)]
pub struct GenerationRun<R> {
    pub records: Vec<R>,
    pub chunks_total: usize,
    pub chunks_attempted: usize,
    pub chunk_failures: Vec<ChunkFailure>,
    pub rejected: usize,
    pub cancelled: bool,
}

impl<R> GenerationRun<R> {
    fn new(chunks_total: usize) -> Self {
        Self {
            records: Vec::new(),
            chunks_total,
            chunks_attempted: 0,
            chunk_failures: Vec::new(),
            rejected: 0,
            cancelled: false,
        }
    }

    fn absorb(&mut self, other: GenerationRun<R>) {
        self.records.extend(other.records);
        self.chunks_total += other.chunks_total;
        self.chunks_attempted += other.chunks_attempted;
        self.chunk_failures.extend(other.chunk_failures);
        self.rejected += other.rejected;
        self.cancelled |= other.cancelled;
    }
}

fn generate_one<R: StudyRecord>(
    llm: &dyn Llm,
    options: &GenerateOptions,
    chunk: &str,
    per_chunk: usize,
) -> Result<(Vec<R>, usize), AppError> {
    let raw = generate_with_fallback(llm, &R::prompt(chunk, per_chunk), options)?;
    let ex = extract_records::<R>(&raw, per_chunk);
    if ex.records.is_empty() {
        return Err(AppError::new(
            codes::AI_EXTRACTION_EMPTY,
            "No valid records recovered from model response",
        )
        .with_details(format!("kind={}; rejected={}", R::KIND.as_str(), ex.rejected)));
    }
    Ok((ex.records, ex.rejected))
}

/// Ask for `per_chunk` records from every chunk, in order.
///
/// A chunk whose generation or extraction fails is logged and skipped. The cancel flag is
/// checked before each chunk.
pub fn generate_from_chunks<R: StudyRecord>(
    llm: &dyn Llm,
    options: &GenerateOptions,
    chunks: &[String],
    per_chunk: usize,
    cancel: &CancelFlag,
) -> GenerationRun<R> {
    let mut run = GenerationRun::new(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(kind = R::KIND.as_str(), chunk = i + 1, total = chunks.len(), "generation cancelled");
            run.cancelled = true;
            break;
        }
        run.chunks_attempted += 1;
        match generate_one::<R>(llm, options, chunk, per_chunk) {
            Ok((records, rejected)) => {
                info!(
                    kind = R::KIND.as_str(),
                    chunk = i + 1,
                    total = chunks.len(),
                    records = records.len(),
                    "generated records"
                );
                run.rejected += rejected;
                run.records.extend(records);
            }
            Err(e) => {
                warn!(kind = R::KIND.as_str(), chunk = i + 1, error = %e, "skipping chunk");
                run.chunk_failures.push(ChunkFailure { chunk: i, error: e });
            }
        }
    }
    run
}

/// Flashcards for each query in order, `per_chunk` requested from each retrieved chunk.
/// Results are concatenated without truncation.
pub fn generate_flashcards_for_queries(
    retriever: &Retriever<'_>,
    llm: &dyn Llm,
    options: &GenerateOptions,
    queries: &[String],
    k: usize,
    per_chunk: usize,
    cancel: &CancelFlag,
) -> GenerationRun<Flashcard> {
    let mut run = GenerationRun::new(0);
    for query in queries {
        if cancel.is_cancelled() {
            run.cancelled = true;
            break;
        }
        let retrieval = retriever.retrieve(query, k);
        if retrieval.is_empty() {
            warn!(query = %query, "no chunks retrieved for flashcard query");
            continue;
        }
        info!(query = %query, chunks = retrieval.chunks.len(), "generating flashcards");
        run.absorb(generate_from_chunks(llm, options, &retrieval.chunks, per_chunk, cancel));
    }
    run
}

/// Up to `total` quiz questions from the chunks nearest to `query`.
pub fn generate_quiz_for_query(
    retriever: &Retriever<'_>,
    llm: &dyn Llm,
    options: &GenerateOptions,
    query: &str,
    k: usize,
    total: usize,
    cancel: &CancelFlag,
) -> GenerationRun<QuizQuestion> {
    let retrieval = retriever.retrieve(query, k);
    if retrieval.is_empty() {
        warn!(query, "no chunks retrieved for quiz query");
        return GenerationRun::new(0);
    }
    let per_chunk = per_chunk_target(total, retrieval.chunks.len());
    info!(
        query,
        chunks = retrieval.chunks.len(),
        per_chunk,
        total,
        "generating quiz"
    );
    let mut run = generate_from_chunks::<QuizQuestion>(llm, options, &retrieval.chunks, per_chunk, cancel);
    run.records = truncate_to_target(run.records, total);
    run
}
