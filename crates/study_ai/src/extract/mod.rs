//! Turns free model text into validated study records.
//!
//! Tiers run in order and the first one that recovers anything wins:
//! a JSON array for the whole text, a JSON array embedded in prose, then kind-specific
//! text heuristics. A recovered JSON array is authoritative even when none of its elements
//! validate, so heuristics never run over JSON text.

use serde_json::Value;
use study_core::domain::{Flashcard, QuizQuestion, RecordKind, StudyItem};
use study_core::validate::{
    flashcard_from_json, normalize_flashcard, quiz_question_from_json, RecordRejection,
};
use tracing::debug;

use crate::prompts;

pub mod heuristic;
pub mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    StrictJson,
    EmbeddedJson,
    Heuristic,
}

/// A record kind the pipeline can generate: its prompt, validation and text fallback.
pub trait StudyRecord: Sized {
    const KIND: RecordKind;

    fn prompt(chunk: &str, count: usize) -> String;
    fn from_json(value: &Value) -> Result<Self, RecordRejection>;
    /// Candidates recovered from non-JSON text, before validation.
    fn parse_heuristic(raw: &str, expected: usize) -> Vec<Self>;
    /// Final check applied to every heuristic candidate.
    fn validate(self) -> Result<Self, RecordRejection>;
    fn into_item(self) -> StudyItem;
}

impl StudyRecord for Flashcard {
    const KIND: RecordKind = RecordKind::Flashcard;

    fn prompt(chunk: &str, count: usize) -> String {
        prompts::flashcard_prompt(chunk, count)
    }

    fn from_json(value: &Value) -> Result<Self, RecordRejection> {
        flashcard_from_json(value)
    }

    fn parse_heuristic(raw: &str, expected: usize) -> Vec<Self> {
        heuristic::flashcards(raw, expected)
    }

    fn validate(self) -> Result<Self, RecordRejection> {
        normalize_flashcard(self)
    }

    fn into_item(self) -> StudyItem {
        StudyItem::Flashcard(self)
    }
}

impl StudyRecord for QuizQuestion {
    const KIND: RecordKind = RecordKind::QuizQuestion;

    fn prompt(chunk: &str, count: usize) -> String {
        prompts::quiz_prompt(chunk, count)
    }

    fn from_json(value: &Value) -> Result<Self, RecordRejection> {
        quiz_question_from_json(value)
    }

    fn parse_heuristic(raw: &str, expected: usize) -> Vec<Self> {
        heuristic::quiz_questions(raw, expected)
    }

    // Heuristic questions are built from typed labels, so only the text needs checking.
    fn validate(self) -> Result<Self, RecordRejection> {
        if self.question.trim().is_empty() {
            return Err(RecordRejection::new("RECORD_FIELD_EMPTY", "question is empty"));
        }
        if self.options.iter().any(|(_, text)| text.trim().is_empty()) {
            return Err(RecordRejection::new("QUIZ_OPTION_MISSING", "option text is empty"));
        }
        Ok(self)
    }

    fn into_item(self) -> StudyItem {
        StudyItem::QuizQuestion(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    /// `None` when no tier recovered anything.
    pub tier: Option<Tier>,
    pub rejected: usize,
}

impl<R> Extraction<R> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            tier: None,
            rejected: 0,
        }
    }
}

fn keep_valid<R, T>(
    candidates: impl IntoIterator<Item = T>,
    check: impl Fn(T) -> Result<R, RecordRejection>,
) -> (Vec<R>, usize) {
    let mut records = Vec::new();
    let mut rejected = 0usize;
    for c in candidates {
        match check(c) {
            Ok(r) => records.push(r),
            Err(rej) => {
                rejected += 1;
                debug!(code = %rej.code, reason = %rej.message, "dropped invalid record");
            }
        }
    }
    (records, rejected)
}

/// Best-effort extraction of `R` records from one raw model response.
///
/// `expected` caps the heuristic tier only; JSON arrays are taken whole.
pub fn extract_records<R: StudyRecord>(raw: &str, expected: usize) -> Extraction<R> {
    if raw.trim().is_empty() {
        return Extraction::empty();
    }

    if let Some((tier, items)) = json::recover_array(raw) {
        let (records, rejected) = keep_valid(items.iter(), R::from_json);
        debug!(kind = R::KIND.as_str(), ?tier, kept = records.len(), rejected, "parsed JSON array");
        return Extraction {
            records,
            tier: Some(tier),
            rejected,
        };
    }

    let candidates = R::parse_heuristic(raw, expected);
    if candidates.is_empty() {
        return Extraction::empty();
    }
    let (records, rejected) = keep_valid(candidates, R::validate);
    debug!(kind = R::KIND.as_str(), kept = records.len(), rejected, "parsed text heuristically");
    Extraction {
        records,
        tier: Some(Tier::Heuristic),
        rejected,
    }
}

/// Kind-dispatched form of [`extract_records`].
pub fn extract(raw: &str, expected: usize, kind: RecordKind) -> Vec<StudyItem> {
    fn items<R: StudyRecord>(raw: &str, expected: usize) -> Vec<StudyItem> {
        extract_records::<R>(raw, expected)
            .records
            .into_iter()
            .map(R::into_item)
            .collect()
    }
    match kind {
        RecordKind::Flashcard => items::<Flashcard>(raw, expected),
        RecordKind::QuizQuestion => items::<QuizQuestion>(raw, expected),
    }
}
