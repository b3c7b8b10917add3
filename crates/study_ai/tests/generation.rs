use std::cell::RefCell;

use pretty_assertions::assert_eq;
use study_ai::corpus::{chunk_words, VectorTable};
use study_ai::embeddings::Embedder;
use study_ai::extract::StudyRecord;
use study_ai::generate::{
    generate_flashcards_for_queries, generate_from_chunks, generate_quiz_for_query, CancelFlag,
};
use study_ai::llm::{GenerateOptions, Llm};
use study_ai::retrieve::Retriever;
use study_core::domain::{Flashcard, QuizQuestion};
use study_core::error::{codes, AppError};

/// Replays scripted responses in call order and records every prompt it sees.
struct ScriptedLlm {
    responses: RefCell<Vec<Result<String, AppError>>>,
    prompts: RefCell<Vec<String>>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl ScriptedLlm {
    fn new(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().rev().collect()),
            prompts: RefCell::new(Vec::new()),
            cancel_after: None,
        }
    }
}

impl Llm for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, AppError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        if let Some((n, flag)) = &self.cancel_after {
            if self.prompts.borrow().len() >= *n {
                flag.cancel();
            }
        }
        self.responses
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| Err(AppError::new(codes::AI_GENERATION_FAILED, "script exhausted")))
    }
}

fn cards_json(prefix: &str, n: usize) -> String {
    let cards: Vec<Flashcard> = (0..n)
        .map(|i| Flashcard {
            question: format!("{prefix} q{i}?"),
            answer: format!("{prefix} a{i}"),
        })
        .collect();
    serde_json::to_string(&cards).expect("encode")
}

fn quiz_json(prefix: &str, n: usize) -> String {
    let qs: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "question": format!("{prefix} {i}?"),
                "options": {"A": "w", "B": "x", "C": "y", "D": "z"},
                "correct_answer": "B",
                "difficulty": "Hard",
            })
        })
        .collect();
    serde_json::to_string(&qs).expect("encode")
}

fn chunks(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("chunk text {i}")).collect()
}

#[test]
fn failed_chunks_are_skipped_and_order_is_kept() {
    let llm = ScriptedLlm::new(vec![
        Ok(cards_json("c0", 2)),
        Err(AppError::new(codes::AI_GENERATION_FAILED, "timed out").with_retryable(true)),
        Ok("I cannot do that.".to_string()),
        Ok(cards_json("c3", 1)),
    ]);
    let run = generate_from_chunks::<Flashcard>(
        &llm,
        &GenerateOptions::default(),
        &chunks(4),
        2,
        &CancelFlag::new(),
    );
    let questions: Vec<&str> = run.records.iter().map(|c| c.question.as_str()).collect();
    assert_eq!(
        questions,
        vec!["c0 q0?", "c0 q1?", "I cannot do that.", "c3 q0?"]
    );
    assert_eq!(run.chunks_attempted, 4);
    assert_eq!(run.chunk_failures.len(), 1);
    assert_eq!(run.chunk_failures[0].chunk, 1);
    assert!(!run.cancelled);

    let prompts = llm.prompts.borrow();
    assert!(prompts[3].contains("chunk text 3"));
    assert!(prompts[3].contains("exactly 2 flashcards"));
}

#[test]
fn unparseable_quiz_chunk_counts_as_failure() {
    let llm = ScriptedLlm::new(vec![Ok("no structure here".to_string()), Ok(quiz_json("q", 1))]);
    let run = generate_from_chunks::<QuizQuestion>(
        &llm,
        &GenerateOptions::default(),
        &chunks(2),
        1,
        &CancelFlag::new(),
    );
    assert_eq!(run.records.len(), 1);
    assert_eq!(run.chunk_failures.len(), 1);
    assert_eq!(run.chunk_failures[0].error.code, codes::AI_EXTRACTION_EMPTY);
}

#[test]
fn cancellation_is_observed_between_chunks() {
    let flag = CancelFlag::new();
    let mut llm = ScriptedLlm::new(vec![
        Ok(cards_json("c0", 1)),
        Ok(cards_json("c1", 1)),
        Ok(cards_json("c2", 1)),
    ]);
    llm.cancel_after = Some((2, flag.clone()));
    let run = generate_from_chunks::<Flashcard>(&llm, &GenerateOptions::default(), &chunks(3), 1, &flag);
    assert!(run.cancelled);
    assert_eq!(run.chunks_attempted, 2);
    assert_eq!(run.records.len(), 2);
    assert_eq!(llm.prompts.borrow().len(), 2);
}

#[test]
fn quiz_prompt_requests_quota_per_chunk() {
    let llm = ScriptedLlm::new(vec![]);
    let _ = generate_from_chunks::<QuizQuestion>(
        &llm,
        &GenerateOptions::default(),
        &chunks(1),
        4,
        &CancelFlag::new(),
    );
    assert_eq!(QuizQuestion::prompt("x", 4), llm.prompts.borrow()[0]);
}

struct LengthEmbedder;

impl Embedder for LengthEmbedder {
    fn model(&self) -> &str {
        "len"
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        Ok(vec![1.0, input.len() as f32 / 100.0])
    }
}

fn three_chunk_table(dir: &std::path::Path) -> VectorTable {
    let table = VectorTable::open(dir.to_path_buf(), "t").expect("open");
    let cs = chunk_words("one two three four five six", 2, 0, "doc").expect("chunk");
    let vs: Vec<Vec<f32>> = cs
        .iter()
        .map(|c| LengthEmbedder.embed(&c.text).expect("embed"))
        .collect();
    table.store(&cs, &vs).expect("store");
    table
}

#[test]
fn quiz_quota_requests_four_of_ten_over_three_chunks_and_truncates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = three_chunk_table(dir.path());
    let retriever = Retriever::new(&table, &LengthEmbedder);
    let llm = ScriptedLlm::new(vec![
        Ok(quiz_json("first", 4)),
        Ok(quiz_json("second", 4)),
        Ok(quiz_json("third", 4)),
    ]);

    let run = generate_quiz_for_query(
        &retriever,
        &llm,
        &GenerateOptions::default(),
        "main topics",
        3,
        10,
        &CancelFlag::new(),
    );
    assert_eq!(run.records.len(), 10);
    assert!(llm.prompts.borrow().iter().all(|p| p.contains("exactly 4 multiple choice")));
    assert_eq!(run.records[0].question, "first 0?");
    assert_eq!(run.records[9].question, "third 1?");
}

#[test]
fn flashcards_are_concatenated_per_query_without_truncation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = three_chunk_table(dir.path());
    let retriever = Retriever::new(&table, &LengthEmbedder);
    let llm = ScriptedLlm::new(vec![
        Ok(cards_json("q1c1", 3)),
        Ok(cards_json("q1c2", 3)),
        Ok(cards_json("q2c1", 3)),
        Ok(cards_json("q2c2", 3)),
    ]);
    let queries = vec!["first query".to_string(), "second query".to_string()];

    let run = generate_flashcards_for_queries(
        &retriever,
        &llm,
        &GenerateOptions::default(),
        &queries,
        2,
        2,
        &CancelFlag::new(),
    );
    assert_eq!(run.records.len(), 12);
    assert_eq!(run.chunks_total, 4);
    assert_eq!(run.records[6].question, "q2c1 q0?");
}
