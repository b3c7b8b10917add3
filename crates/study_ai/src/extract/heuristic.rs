//! Pattern-based fallbacks for responses with no recoverable JSON.

use std::sync::LazyLock;

use regex::Regex;
use study_core::domain::{Difficulty, Flashcard, OptionLabel, QuizOptions, QuizQuestion};

const PLACEHOLDER_ANSWER: &str = "(see text)";

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("heuristic regex is invalid: {err}"),
    }
}

static QUESTION_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^q\s*[:)]\s*(.*)$"));
static ANSWER_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^a\s*[:)]\s*(.*)$"));
static QUIZ_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(?:q\d+\.|question\s*\d+:|\d+\.\s)"));
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\*?([A-D])[).:]\s+(.+)$"));

fn cap(expected: usize) -> usize {
    if expected == 0 {
        usize::MAX
    } else {
        expected
    }
}

fn push_line(buf: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(line);
}

/// `Q:` / `A:` line pairs. Text following a marker line continues the current field until
/// the next marker. A question never followed by an `A:` line is not a pair.
pub fn qa_pairs(raw: &str) -> Vec<Flashcard> {
    let mut out = Vec::new();
    let mut question: Option<String> = None;
    let mut answer: Option<String> = None;

    for line in raw.lines().map(str::trim) {
        if let Some(c) = QUESTION_LINE.captures(line) {
            if let (Some(q), Some(a)) = (question.take(), answer.take()) {
                out.push(Flashcard { question: q, answer: a });
            }
            question = Some(c.get(1).map_or("", |m| m.as_str()).trim().to_string());
        } else if let Some(c) = ANSWER_LINE.captures(line) {
            if question.is_some() && answer.is_none() {
                answer = Some(c.get(1).map_or("", |m| m.as_str()).trim().to_string());
            } else if let Some(a) = answer.as_mut() {
                push_line(a, line);
            }
        } else if let Some(a) = answer.as_mut() {
            push_line(a, line);
        } else if let Some(q) = question.as_mut() {
            push_line(q, line);
        }
    }
    if let (Some(q), Some(a)) = (question, answer) {
        out.push(Flashcard { question: q, answer: a });
    }
    out
}

fn blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Blank-line separated blocks. The first line ending in `?` is the question and the lines
/// after it form the answer; without such a line the first line is the question.
pub fn block_cards(raw: &str, expected: usize) -> Vec<Flashcard> {
    blocks(raw)
        .into_iter()
        .take(cap(expected))
        .map(|lines| {
            let qi = lines.iter().position(|l| l.ends_with('?')).unwrap_or(0);
            let answer = lines[qi + 1..].join(" ");
            Flashcard {
                question: lines[qi].to_string(),
                answer: if answer.trim().is_empty() {
                    PLACEHOLDER_ANSWER.to_string()
                } else {
                    answer
                },
            }
        })
        .collect()
}

pub fn flashcards(raw: &str, expected: usize) -> Vec<Flashcard> {
    let pairs = qa_pairs(raw);
    if pairs.is_empty() {
        block_cards(raw, expected)
    } else {
        pairs
    }
}

/// Blocks starting at question anchors (`Q1.`, `Question 1:`, `1. `). Text before the first
/// anchor is dropped; without any anchor the whole text is one block.
fn quiz_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut out: Vec<Vec<&str>> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if QUIZ_ANCHOR.is_match(trimmed) {
            out.push(vec![trimmed]);
        } else if let Some(current) = out.last_mut() {
            current.push(line);
        } else {
            preamble.push(line);
        }
    }
    if out.is_empty() && !preamble.is_empty() {
        out.push(preamble);
    }
    out
}

/// First option label in A..D order carrying a correctness marker, else `A`.
fn infer_correct(block: &str) -> OptionLabel {
    OptionLabel::ALL
        .into_iter()
        .find(|l| {
            let s = l.as_str();
            block.contains(&format!("({s})"))
                || block.contains(&format!("*{s}"))
                || block.contains(&format!("Correct: {s}"))
        })
        .unwrap_or(OptionLabel::A)
}

/// Earliest of "easy" / "medium" / "hard" anywhere in the block, question text included.
/// A question body mentioning "hard" is therefore read as Hard.
fn infer_difficulty(block: &str) -> Difficulty {
    let lower = block.to_lowercase();
    [
        ("easy", Difficulty::Easy),
        ("medium", Difficulty::Medium),
        ("hard", Difficulty::Hard),
    ]
    .into_iter()
    .filter_map(|(word, d)| lower.find(word).map(|pos| (pos, d)))
    .min_by_key(|(pos, _)| *pos)
    .map(|(_, d)| d)
    .unwrap_or_default()
}

fn parse_quiz_block(lines: &[&str]) -> Option<QuizQuestion> {
    let lines: Vec<&str> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    if lines.len() < 5 {
        return None;
    }
    let question = lines[0].to_string();

    let mut found: [Option<String>; 4] = Default::default();
    for line in &lines[1..] {
        let Some(c) = OPTION_LINE.captures(line) else {
            continue;
        };
        let label = c
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .and_then(OptionLabel::from_char)?;
        let slot = &mut found[label as usize];
        if slot.is_none() {
            *slot = c.get(2).map(|m| m.as_str().trim().to_string());
        }
    }
    let [Some(a), Some(b), Some(c), Some(d)] = found else {
        return None;
    };

    let block = lines.join("\n");
    Some(QuizQuestion {
        question,
        options: QuizOptions { a, b, c, d },
        correct_answer: infer_correct(&block),
        difficulty: infer_difficulty(&block),
    })
}

pub fn quiz_questions(raw: &str, expected: usize) -> Vec<QuizQuestion> {
    quiz_blocks(raw)
        .iter()
        .take(cap(expected))
        .filter_map(|b| parse_quiz_block(b))
        .collect()
}
