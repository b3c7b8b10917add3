use std::path::PathBuf;
use std::time::Duration;

use study_ai::corpus::{ingest_source, IngestReport, TextSource, VectorTable};
use study_ai::embeddings::ollama_embed::OllamaEmbedder;
use study_ai::embeddings::Embedder;
use study_ai::generate::{
    generate_flashcards_for_queries, generate_quiz_for_query, CancelFlag, GenerationRun,
};
use study_ai::llm::ollama_llm::OllamaLlm;
use study_ai::llm::{GenerateOptions, Llm};
use study_ai::ollama::OllamaClient;
use study_ai::retrieve::Retriever;
use study_core::artifacts::write_artifacts;
use study_core::config::PipelineConfig;
use study_core::domain::{Flashcard, QuizQuestion};
use study_core::error::AppError;
use study_core::report::{format_summary_timestamp, RunSummary};
use time::OffsetDateTime;
use tracing::info;

/// Document in, study material out: ingest, generate, render.
///
/// Configuration is validated once at construction and never re-read.
pub struct StudyPipeline {
    config: PipelineConfig,
    embedder: Box<dyn Embedder>,
    llm: Box<dyn Llm>,
    table: VectorTable,
    cancel: CancelFlag,
}

impl StudyPipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn Llm>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let table = VectorTable::open(config.db_path.clone(), &config.table_name)?;
        Ok(Self {
            config,
            embedder,
            llm,
            table,
            cancel: CancelFlag::new(),
        })
    }

    /// Bind both capabilities to the Ollama server named in `config`.
    pub fn with_ollama(config: PipelineConfig) -> Result<Self, AppError> {
        config.validate()?;
        let client = OllamaClient::new(
            &config.ollama_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let embedder = OllamaEmbedder::new(client.clone(), config.embedding_model.clone());
        let llm = OllamaLlm::new(client, config.generation_model.clone());
        Self::new(config, Box::new(embedder), Box::new(llm))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn table(&self) -> &VectorTable {
        &self.table
    }

    /// Handle for cancelling in-flight generation from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn generate_options(&self) -> GenerateOptions {
        GenerateOptions::default().with_device(self.config.device())
    }

    fn retriever(&self) -> Retriever<'_> {
        Retriever::new(&self.table, self.embedder.as_ref())
    }

    pub fn process_document(&self, source: &dyn TextSource) -> Result<IngestReport, AppError> {
        info!(source = source.label(), table = self.table.name(), "processing document");
        ingest_source(
            source,
            &self.table,
            self.embedder.as_ref(),
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
    }

    pub fn generate_flashcards(&self) -> GenerationRun<Flashcard> {
        let run = generate_flashcards_for_queries(
            &self.retriever(),
            self.llm.as_ref(),
            &self.generate_options(),
            &self.config.flashcard_queries,
            self.config.k_chunks,
            self.config.flashcards_per_chunk,
            &self.cancel,
        );
        info!(
            flashcards = run.records.len(),
            failed_chunks = run.chunk_failures.len(),
            rejected = run.rejected,
            "flashcard generation finished"
        );
        run
    }

    pub fn generate_quiz(&self) -> GenerationRun<QuizQuestion> {
        let run = generate_quiz_for_query(
            &self.retriever(),
            self.llm.as_ref(),
            &self.generate_options(),
            &self.config.quiz_query,
            self.config.k_chunks,
            self.config.quiz_questions,
            &self.cancel,
        );
        info!(
            questions = run.records.len(),
            target = self.config.quiz_questions,
            failed_chunks = run.chunk_failures.len(),
            "quiz generation finished"
        );
        run
    }

    /// Write all artifacts for this run under `output_dir`, stamped with the current time.
    pub fn save_outputs(
        &self,
        namespace: &str,
        flashcards: &[Flashcard],
        quiz: &[QuizQuestion],
    ) -> Result<Vec<PathBuf>, AppError> {
        let summary = RunSummary {
            generated_at: format_summary_timestamp(OffsetDateTime::now_utc())?,
            config: &self.config,
            flashcard_count: flashcards.len(),
            quiz_count: quiz.len(),
        };
        Ok(write_artifacts(
            &self.config.output_dir,
            namespace,
            flashcards,
            quiz,
            &summary,
        ))
    }
}

/// File stem of `path`, reduced to characters that are safe in table and file names.
pub fn namespace_for(path: &std::path::Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "output".to_string()
    } else {
        cleaned
    }
}
