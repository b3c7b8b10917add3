use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use study_core::artifacts::{
    remove_artifacts, upload_artifacts, ArtifactStore, Bucket, LocalBucketStore,
};
use study_core::config::PipelineConfig;
use study_core::domain::{Difficulty, Flashcard, OptionLabel, QuizOptions, QuizQuestion};
use study_core::error::{codes, AppError};
use study_core::report::RunSummary;

fn cards() -> Vec<Flashcard> {
    vec![
        Flashcard {
            question: "What is a chunk?".to_string(),
            answer: "A window of words.".to_string(),
        },
        Flashcard {
            question: "What is an embedding?".to_string(),
            answer: "A vector.".to_string(),
        },
    ]
}

fn quiz() -> Vec<QuizQuestion> {
    vec![QuizQuestion {
        question: "Which metric ranks chunks?".to_string(),
        options: QuizOptions {
            a: "Euclidean".to_string(),
            b: "Cosine".to_string(),
            c: "Hamming".to_string(),
            d: "Manhattan".to_string(),
        },
        correct_answer: OptionLabel::B,
        difficulty: Difficulty::Medium,
    }]
}

fn summary(cfg: &PipelineConfig, quiz_count: usize) -> RunSummary<'_> {
    RunSummary {
        generated_at: "2026-02-10 09:30:00".to_string(),
        config: cfg,
        flashcard_count: 2,
        quiz_count,
    }
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect()
}

#[test]
fn writes_every_artifact_with_namespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = PipelineConfig::default();
    let written = study_core::artifacts::write_artifacts(
        dir.path(),
        "book",
        &cards(),
        &quiz(),
        &summary(&cfg, 1),
    );
    assert_eq!(
        names(&written),
        vec![
            "flashcards_book.json",
            "quiz_book.json",
            "answer_key_book.txt",
            "quiz_student_book.txt",
            "summary_book.txt",
        ]
    );

    let key = fs::read_to_string(dir.path().join("answer_key_book.txt")).expect("read");
    assert_eq!(
        key,
        "QUIZ ANSWER KEY\n==================================================\n\nQuestion 1: B (Difficulty: Medium)\n  Which metric ranks chunks?\n"
    );

    let flash: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written[0]).expect("read")).expect("json");
    assert_eq!(flash[1]["answer"], "A vector.");
    let quiz_v: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written[1]).expect("read")).expect("json");
    assert_eq!(quiz_v[0]["options"]["B"], "Cosine");
    assert_eq!(quiz_v[0]["correct_answer"], "B");
}

#[test]
fn quiz_files_are_skipped_without_questions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = PipelineConfig::default();
    let written =
        study_core::artifacts::write_artifacts(dir.path(), "book", &cards(), &[], &summary(&cfg, 0));
    assert_eq!(names(&written), vec!["flashcards_book.json", "summary_book.txt"]);
    let text = fs::read_to_string(dir.path().join("summary_book.txt")).expect("read");
    assert!(!text.contains("Total Quiz Questions"));
}

#[test]
fn rewriting_same_records_is_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = PipelineConfig::default();
    let first =
        study_core::artifacts::write_artifacts(dir.path(), "a", &cards(), &quiz(), &summary(&cfg, 1));
    let second =
        study_core::artifacts::write_artifacts(dir.path(), "b", &cards(), &quiz(), &summary(&cfg, 1));
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(fs::read(a).expect("a"), fs::read(b).expect("b"), "{}", a.display());
    }
}

#[test]
fn blocked_artifact_does_not_stop_siblings() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory squatting on the quiz file name makes that single write fail.
    fs::create_dir(dir.path().join("quiz_book.json")).expect("mkdir");
    let cfg = PipelineConfig::default();
    let written =
        study_core::artifacts::write_artifacts(dir.path(), "book", &cards(), &quiz(), &summary(&cfg, 1));
    let got = names(&written);
    assert!(!got.contains(&"quiz_book.json".to_string()));
    assert_eq!(got.len(), 4);
}

#[test]
fn upload_routes_by_prefix_and_skips_unknown_files() {
    let out = tempfile::tempdir().expect("out");
    let buckets = tempfile::tempdir().expect("buckets");
    let cfg = PipelineConfig::default();
    let mut written =
        study_core::artifacts::write_artifacts(out.path(), "book", &cards(), &quiz(), &summary(&cfg, 1));
    let stray = out.path().join("notes.txt");
    fs::write(&stray, "x").expect("write");
    written.push(stray.clone());

    let store = LocalBucketStore::open(buckets.path().to_path_buf());
    let keys = upload_artifacts(&store, "me@example.com", &written).expect("upload");
    assert_eq!(
        keys,
        vec![
            "flashcards/me@example.com/flashcards_book.json",
            "quizzes/me@example.com/quiz_book.json",
            "answer-keys/me@example.com/answer_key_book.txt",
            "student-quizzes/me@example.com/quiz_student_book.txt",
            "summaries/me@example.com/summary_book.txt",
        ]
    );
    assert!(store
        .object_path(Bucket::StudentQuizzes, "me@example.com/quiz_student_book.txt")
        .exists());

    remove_artifacts(&written);
    assert!(written.iter().all(|p| !p.exists()));
}

struct RefusingStore;

impl ArtifactStore for RefusingStore {
    fn put(&self, _bucket: Bucket, _key: &str, _bytes: &[u8]) -> Result<(), AppError> {
        Err(AppError::new(codes::UPLOAD_FAILED, "bucket unavailable"))
    }
}

#[test]
fn upload_failure_is_an_error() {
    let out = tempfile::tempdir().expect("out");
    let path = out.path().join("summary_x.txt");
    fs::write(&path, "s").expect("write");
    let err = upload_artifacts(&RefusingStore, "owner", &[path]).unwrap_err();
    assert_eq!(err.code, codes::UPLOAD_FAILED);
}
