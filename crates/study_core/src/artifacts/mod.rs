use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Flashcard, QuizQuestion};
use crate::error::{codes, AppError};
use crate::report::{
    answer_key_text, flashcards_json, quiz_json, student_view_text, summary_text, RunSummary,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Flashcards,
    Quizzes,
    AnswerKeys,
    StudentQuizzes,
    Summaries,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Flashcards => "flashcards",
            Bucket::Quizzes => "quizzes",
            Bucket::AnswerKeys => "answer-keys",
            Bucket::StudentQuizzes => "student-quizzes",
            Bucket::Summaries => "summaries",
        }
    }
}

/// Route an artifact to its bucket by filename prefix (case-insensitive).
///
/// `quiz_student_` is checked before `quiz_` so student sheets are not filed as quizzes.
pub fn bucket_for_artifact(filename: &str) -> Option<Bucket> {
    let name = filename.to_lowercase();
    let routes = [
        ("flashcards_", Bucket::Flashcards),
        ("quiz_student_", Bucket::StudentQuizzes),
        ("quiz_", Bucket::Quizzes),
        ("answer_key_", Bucket::AnswerKeys),
        ("summary_", Bucket::Summaries),
    ];
    routes
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, bucket)| *bucket)
}

fn write_one(path: &Path, contents: &str) -> Result<(), AppError> {
    fs::write(path, contents.as_bytes()).map_err(|e| {
        AppError::new(codes::OUTPUT_WRITE_FAILED, "Failed to write artifact")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

/// Write every artifact for one run into `dir`.
///
/// A failed write is logged and that file is left out of the returned list; sibling writes
/// still happen. Quiz-derived files are only produced when there is at least one question.
pub fn write_artifacts(
    dir: &Path,
    namespace: &str,
    flashcards: &[Flashcard],
    quiz: &[QuizQuestion],
    summary: &RunSummary<'_>,
) -> Vec<PathBuf> {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to create output directory");
        return Vec::new();
    }

    let mut planned: Vec<(String, Result<String, AppError>)> = Vec::new();
    planned.push((format!("flashcards_{namespace}.json"), flashcards_json(flashcards)));
    if !quiz.is_empty() {
        planned.push((format!("quiz_{namespace}.json"), quiz_json(quiz)));
        planned.push((format!("answer_key_{namespace}.txt"), Ok(answer_key_text(quiz))));
        planned.push((
            format!("quiz_student_{namespace}.txt"),
            Ok(student_view_text(quiz)),
        ));
    }
    planned.push((format!("summary_{namespace}.txt"), Ok(summary_text(summary))));

    let mut written = Vec::new();
    for (name, rendered) in planned {
        let path = dir.join(&name);
        match rendered.and_then(|body| write_one(&path, &body)) {
            Ok(()) => written.push(path),
            Err(e) => warn!(artifact = %name, error = %e, "artifact not written"),
        }
    }
    info!(dir = %dir.display(), count = written.len(), "artifacts written");
    written
}

/// Best-effort removal of local outputs, e.g. after upload.
pub fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        if !path.exists() {
            continue;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove artifact");
        }
    }
}

/// Object storage addressed by bucket and key.
pub trait ArtifactStore {
    fn put(&self, bucket: Bucket, key: &str, bytes: &[u8]) -> Result<(), AppError>;
}

/// Buckets as directories under a root: `<root>/<bucket>/<key>`. Existing objects are replaced.
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn object_path(&self, bucket: Bucket, key: &str) -> PathBuf {
        self.root.join(bucket.as_str()).join(key)
    }
}

impl ArtifactStore for LocalBucketStore {
    fn put(&self, bucket: Bucket, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::new(codes::UPLOAD_FAILED, "Failed to create bucket directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| {
            AppError::new(codes::UPLOAD_FAILED, "Failed to write object")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new(codes::UPLOAD_FAILED, "Failed to finalize object write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })
    }
}

/// Upload each file to the bucket its name selects, keyed `<owner>/<filename>`.
///
/// Returns `bucket/owner/filename` for every uploaded file. Unrecognized names are skipped.
pub fn upload_artifacts(
    store: &dyn ArtifactStore,
    owner: &str,
    files: &[PathBuf],
) -> Result<Vec<String>, AppError> {
    let mut uploaded = Vec::new();
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(bucket) = bucket_for_artifact(name) else {
            warn!(file = %name, "no bucket for artifact; skipping upload");
            continue;
        };
        let bytes = fs::read(path).map_err(|e| {
            AppError::new(codes::UPLOAD_FAILED, "Failed to read artifact for upload")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let key = format!("{owner}/{name}");
        store.put(bucket, &key, &bytes)?;
        uploaded.push(format!("{}/{}", bucket.as_str(), key));
    }
    Ok(uploaded)
}
