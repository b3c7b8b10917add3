use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use study_ai::corpus::PlainTextFile;
use study_ai::ollama::OllamaClient;
use study_core::artifacts::{ArtifactStore, LocalBucketStore};
use study_core::config::PipelineConfig;
use study_core::domain::DifficultyBreakdown;
use study_core::error::{codes, AppError};
use study_core::jobs::SqliteJobStore;
use study_core::report::{flashcards_view_text, student_view_text, instructor_view_text};
use studysnap_lib::pipeline::namespace_for;
use studysnap_lib::{run_job, JobRequest, StudyPipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studysnap", about = "Turn a document into flashcards and a quiz")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,
}

/// Per-field overrides applied on top of the configuration file.
#[derive(Args, Default)]
struct Overrides {
    /// Source text file
    #[arg(long, global = true)]
    source: Option<PathBuf>,
    #[arg(long, global = true)]
    ollama_url: Option<String>,
    #[arg(long, global = true)]
    embedding_model: Option<String>,
    #[arg(long, global = true)]
    generation_model: Option<String>,
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    table: Option<String>,
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    chunk_size: Option<usize>,
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,
    #[arg(long, global = true)]
    k_chunks: Option<usize>,
    #[arg(long, global = true)]
    quiz_questions: Option<usize>,
    /// Ask the backend to generate on CUDA
    #[arg(long, global = true)]
    use_cuda: bool,
}

impl Overrides {
    fn apply(self, cfg: &mut PipelineConfig) {
        if let Some(v) = self.source {
            cfg.source_path = v;
        }
        if let Some(v) = self.ollama_url {
            cfg.ollama_url = v;
        }
        if let Some(v) = self.embedding_model {
            cfg.embedding_model = v;
        }
        if let Some(v) = self.generation_model {
            cfg.generation_model = v;
        }
        if let Some(v) = self.db_path {
            cfg.db_path = v;
        }
        if let Some(v) = self.table {
            cfg.table_name = v;
        }
        if let Some(v) = self.output_dir {
            cfg.output_dir = v;
        }
        if let Some(v) = self.chunk_size {
            cfg.chunk_size = v;
        }
        if let Some(v) = self.chunk_overlap {
            cfg.chunk_overlap = v;
        }
        if let Some(v) = self.k_chunks {
            cfg.k_chunks = v;
        }
        if let Some(v) = self.quiz_questions {
            cfg.quiz_questions = v;
        }
        if self.use_cuda {
            cfg.use_cuda = true;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the Ollama server answers
    Health,
    /// Chunk, embed and index the source document
    Ingest,
    /// Generate flashcards from an indexed document
    Flashcards {
        /// Print JSON instead of the listing
        #[arg(long)]
        json: bool,
    },
    /// Generate a quiz from an indexed document
    Quiz {
        /// Hide correct answers
        #[arg(long)]
        student: bool,
    },
    /// Ingest, generate and write all outputs
    Run {
        /// Skip quiz generation
        #[arg(long)]
        no_quiz: bool,
        /// Output file namespace (defaults to the source file stem)
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Run the pipeline as a tracked job
    Job(JobArgs),
}

#[derive(Args)]
struct JobArgs {
    #[arg(long)]
    document_id: String,
    #[arg(long)]
    email: Option<String>,
    /// Defaults to a fresh UUID
    #[arg(long)]
    job_id: Option<String>,
    /// SQLite database holding job statuses
    #[arg(long, default_value = "studysnap.sqlite")]
    jobs_db: PathBuf,
    /// Upload outputs into bucket directories under this root
    #[arg(long)]
    bucket_root: Option<PathBuf>,
    #[arg(long)]
    no_quiz: bool,
}

fn load_config(path: Option<&PathBuf>, overrides: Overrides) -> Result<PipelineConfig, AppError> {
    let mut cfg = PipelineConfig::load(path.map(PathBuf::as_path))?;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::OUTPUT_WRITE_FAILED, "Failed to encode output").with_details(e.to_string())
    })?;
    println!("{s}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let table_overridden = cli.overrides.table.is_some();
    let mut cfg = load_config(cli.config.as_ref(), cli.overrides)?;

    match cli.command {
        Commands::Health => {
            let client = OllamaClient::new(
                &cfg.ollama_url,
                Duration::from_secs(cfg.request_timeout_secs),
            )?;
            client.health_check()?;
            println!("Ollama reachable at {}", client.base_url());
        }
        Commands::Ingest => {
            let pipeline = StudyPipeline::with_ollama(cfg)?;
            let source = PlainTextFile::new(pipeline.config().source_path.clone());
            let report = pipeline.process_document(&source)?;
            print_json(&report)?;
        }
        Commands::Flashcards { json } => {
            let pipeline = StudyPipeline::with_ollama(cfg)?;
            let run = pipeline.generate_flashcards();
            if json {
                print_json(&run.records)?;
            } else {
                print!("{}", flashcards_view_text(&run.records));
            }
        }
        Commands::Quiz { student } => {
            let pipeline = StudyPipeline::with_ollama(cfg)?;
            let run = pipeline.generate_quiz();
            if student {
                print!("{}", student_view_text(&run.records));
            } else {
                print!("{}", instructor_view_text(&run.records));
            }
        }
        Commands::Run { no_quiz, namespace } => {
            let namespace = namespace.unwrap_or_else(|| namespace_for(&cfg.source_path));
            let pipeline = StudyPipeline::with_ollama(cfg)?;
            let source = PlainTextFile::new(pipeline.config().source_path.clone());
            pipeline.process_document(&source)?;

            let flashcards = pipeline.generate_flashcards();
            if flashcards.records.is_empty() {
                return Err(AppError::new(codes::JOB_FAILED, "no flashcards generated"));
            }
            print!("{}", flashcards_view_text(&flashcards.records));

            let quiz = if no_quiz {
                Vec::new()
            } else {
                let run = pipeline.generate_quiz();
                if run.records.is_empty() {
                    tracing::warn!("no quiz questions were generated; continuing with flashcards");
                } else {
                    let b = DifficultyBreakdown::of(&run.records);
                    tracing::info!(easy = b.easy, medium = b.medium, hard = b.hard, "quiz difficulty");
                    print!("{}", instructor_view_text(&run.records));
                }
                run.records
            };

            let written = pipeline.save_outputs(&namespace, &flashcards.records, &quiz)?;
            if written.is_empty() {
                return Err(AppError::new(codes::OUTPUT_WRITE_FAILED, "no outputs were saved"));
            }
            for path in written {
                println!("{}", path.display());
            }
        }
        Commands::Job(args) => {
            let namespace = namespace_for(&cfg.source_path);
            if !table_overridden {
                cfg.table_name = namespace.clone();
            }
            let mut conn = study_core::db::open(&args.jobs_db)?;
            study_core::db::migrate(&mut conn)?;
            let sink = SqliteJobStore::new(conn);
            let store = args.bucket_root.map(LocalBucketStore::open);

            let pipeline = StudyPipeline::with_ollama(cfg)?;
            let source = PlainTextFile::new(pipeline.config().source_path.clone());
            let request = JobRequest {
                job_id: args
                    .job_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                document_id: args.document_id,
                email: args.email,
                namespace,
                include_quiz: !args.no_quiz,
            };
            let outcome = run_job(
                &pipeline,
                &source,
                &request,
                &sink,
                store.as_ref().map(|s| s as &dyn ArtifactStore),
            )?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
