//! Deterministic renderings of validated records.
//!
//! Nothing here touches the network, the index or the clock: the summary timestamp is
//! supplied by the caller so identical inputs always render identical bytes.

use time::format_description;
use time::OffsetDateTime;

use crate::config::PipelineConfig;
use crate::domain::{DifficultyBreakdown, Flashcard, QuizQuestion};
use crate::error::{codes, AppError};

const RULE_WIDE: usize = 70;
const RULE_KEY: usize = 50;

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T, what: &str) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::OUTPUT_WRITE_FAILED, format!("Failed to encode {what}"))
            .with_details(e.to_string())
    })
}

/// `[{"question": .., "answer": ..}]`, two-space indented.
pub fn flashcards_json(cards: &[Flashcard]) -> Result<String, AppError> {
    to_pretty_json(cards, "flashcards")
}

/// `[{"question", "options": {"A".."D"}, "correct_answer", "difficulty"}]`, two-space indented.
pub fn quiz_json(questions: &[QuizQuestion]) -> Result<String, AppError> {
    to_pretty_json(questions, "quiz")
}

pub fn answer_key_text(questions: &[QuizQuestion]) -> String {
    let mut lines: Vec<String> = vec![
        "QUIZ ANSWER KEY".to_string(),
        "=".repeat(RULE_KEY),
        String::new(),
    ];
    for (i, q) in questions.iter().enumerate() {
        lines.push(format!(
            "Question {}: {} (Difficulty: {})",
            i + 1,
            q.correct_answer.as_str(),
            q.difficulty.as_str()
        ));
        lines.push(format!("  {}", q.question));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn breakdown_line(questions: &[QuizQuestion]) -> String {
    let b = DifficultyBreakdown::of(questions);
    format!(
        "Difficulty Breakdown: Easy: {}, Medium: {}, Hard: {}",
        b.easy, b.medium, b.hard
    )
}

fn render_quiz(questions: &[QuizQuestion], show_answers: bool) -> String {
    if questions.is_empty() {
        return "No quiz questions to display.\n".to_string();
    }
    let rule = "=".repeat(RULE_WIDE);
    let mut out = String::new();
    out.push_str(&format!("\n{rule}\n"));
    if show_answers {
        out.push_str(&format!("Generated {} Quiz Questions\n", questions.len()));
    } else {
        out.push_str(&format!("Quiz - {} Questions\n", questions.len()));
    }
    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!("\n{}\n", breakdown_line(questions)));
    out.push_str(&format!("{rule}\n"));

    for (i, q) in questions.iter().enumerate() {
        out.push_str(&format!("\nQuestion {}: [{}]\n", i + 1, q.difficulty.as_str()));
        out.push_str(&format!("  {}\n", q.question));
        for (label, text) in q.options.iter() {
            let marker = if show_answers && label == q.correct_answer {
                " ✓"
            } else {
                ""
            };
            out.push_str(&format!("    {}) {}{}\n", label.as_str(), text, marker));
        }
    }

    out.push_str(&format!("\n{rule}\n"));
    if show_answers {
        out.push_str("(✓ marks the correct answer)\n");
    } else {
        out.push_str("End of Quiz\n");
    }
    out.push_str(&format!("{rule}\n"));
    out
}

/// Quiz as handed to students: no correct-answer markers.
pub fn student_view_text(questions: &[QuizQuestion]) -> String {
    render_quiz(questions, false)
}

/// Quiz with `✓` next to each correct option.
pub fn instructor_view_text(questions: &[QuizQuestion]) -> String {
    render_quiz(questions, true)
}

pub fn flashcards_view_text(cards: &[Flashcard]) -> String {
    if cards.is_empty() {
        return "No flashcards to display.\n".to_string();
    }
    let rule = "=".repeat(RULE_WIDE);
    let mut out = format!("\n{rule}\nGenerated {} Flashcards\n{rule}\n", cards.len());
    for (i, card) in cards.iter().enumerate() {
        out.push_str(&format!("\nFlashcard {}:\n", i + 1));
        out.push_str(&format!("  Q: {}\n", card.question));
        out.push_str(&format!("  A: {}\n", card.answer));
    }
    out.push_str(&format!("\n{rule}\n"));
    out
}

/// `YYYY-MM-DD HH:MM:SS`, as printed in run summaries.
pub fn format_summary_timestamp(at: OffsetDateTime) -> Result<String, AppError> {
    let fmt = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]").map_err(
        |e| AppError::new(codes::OUTPUT_WRITE_FAILED, "Invalid timestamp format").with_details(e.to_string()),
    )?;
    at.format(&fmt).map_err(|e| {
        AppError::new(codes::OUTPUT_WRITE_FAILED, "Failed to format timestamp").with_details(e.to_string())
    })
}

#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub generated_at: String,
    pub config: &'a PipelineConfig,
    pub flashcard_count: usize,
    pub quiz_count: usize,
}

pub fn summary_text(summary: &RunSummary<'_>) -> String {
    let cfg = summary.config;
    let source = cfg.source_path.display();
    let quiz_section = if summary.quiz_count > 0 {
        format!("\nTotal Quiz Questions: {}", summary.quiz_count)
    } else {
        String::new()
    };
    format!(
        "PDF Processing and Content Generation Summary
=============================================

Generated: {generated_at}
Source PDF: {source}
Total Flashcards: {flashcards}{quiz_section}

Configuration:
- PDF Path: {source}
- Embedding Model: {embedding_model}
- Generation Model: {generation_model}
- Database Path: {db_path}
- Table Name: {table_name}
- Chunk Size: {chunk_size} words
- Chunk Overlap: {chunk_overlap} words
- Chunks Retrieved per Query: {k_chunks}
- Flashcards per Chunk: {per_chunk}
- Quiz Questions: {quiz_questions}
",
        generated_at = summary.generated_at,
        flashcards = summary.flashcard_count,
        embedding_model = cfg.embedding_model,
        generation_model = cfg.generation_model,
        db_path = cfg.db_path.display(),
        table_name = cfg.table_name,
        chunk_size = cfg.chunk_size,
        chunk_overlap = cfg.chunk_overlap,
        k_chunks = cfg.k_chunks,
        per_chunk = cfg.flashcards_per_chunk,
        quiz_questions = cfg.quiz_questions,
    )
}
