use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Difficulty, Flashcard, OptionLabel, QuizOptions, QuizQuestion};

/// Why a parsed record was dropped. Rejections are counted, never surfaced as errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordRejection {
    pub code: String,
    pub message: String,
}

impl RecordRejection {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Result<String, RecordRejection> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(RecordRejection::new(
            "RECORD_FIELD_EMPTY",
            format!("{field} is empty"),
        )),
        Some(_) => Err(RecordRejection::new(
            "RECORD_FIELD_TYPE",
            format!("{field} is not a string"),
        )),
        None => Err(RecordRejection::new(
            "RECORD_FIELD_MISSING",
            format!("{field} is missing"),
        )),
    }
}

/// Trim both fields and require them to be non-empty.
pub fn normalize_flashcard(card: Flashcard) -> Result<Flashcard, RecordRejection> {
    let question = card.question.trim();
    let answer = card.answer.trim();
    if question.is_empty() {
        return Err(RecordRejection::new("RECORD_FIELD_EMPTY", "question is empty"));
    }
    if answer.is_empty() {
        return Err(RecordRejection::new("RECORD_FIELD_EMPTY", "answer is empty"));
    }
    Ok(Flashcard {
        question: question.to_string(),
        answer: answer.to_string(),
    })
}

pub fn flashcard_from_json(v: &Value) -> Result<Flashcard, RecordRejection> {
    let Value::Object(obj) = v else {
        return Err(RecordRejection::new("RECORD_NOT_OBJECT", "flashcard is not an object"));
    };
    Ok(Flashcard {
        question: required_text(obj, "question")?,
        answer: required_text(obj, "answer")?,
    })
}

fn option_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A quiz question is valid iff options A-D are all present and
/// `correct_answer` / `difficulty` are exact members of their enumerations.
/// Extra option labels are ignored.
pub fn quiz_question_from_json(v: &Value) -> Result<QuizQuestion, RecordRejection> {
    let Value::Object(obj) = v else {
        return Err(RecordRejection::new("RECORD_NOT_OBJECT", "quiz question is not an object"));
    };
    let question = required_text(obj, "question")?;

    let Some(Value::Object(opts)) = obj.get("options") else {
        return Err(RecordRejection::new(
            "QUIZ_OPTIONS_INVALID",
            "options must be an object",
        ));
    };
    let mut texts: Vec<String> = Vec::with_capacity(4);
    for label in OptionLabel::ALL {
        let text = opts.get(label.as_str()).and_then(option_text).ok_or_else(|| {
            RecordRejection::new(
                "QUIZ_OPTION_MISSING",
                format!("option {} is missing", label.as_str()),
            )
        })?;
        texts.push(text);
    }
    let mut texts = texts.into_iter();
    let options = QuizOptions {
        a: texts.next().unwrap_or_default(),
        b: texts.next().unwrap_or_default(),
        c: texts.next().unwrap_or_default(),
        d: texts.next().unwrap_or_default(),
    };

    let correct_answer = obj
        .get("correct_answer")
        .and_then(Value::as_str)
        .and_then(OptionLabel::parse)
        .ok_or_else(|| {
            RecordRejection::new("QUIZ_ANSWER_INVALID", "correct_answer must be one of A, B, C, D")
        })?;

    let difficulty = obj
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .ok_or_else(|| {
            RecordRejection::new(
                "QUIZ_DIFFICULTY_INVALID",
                "difficulty must be one of Easy, Medium, Hard",
            )
        })?;

    Ok(QuizQuestion {
        question,
        options,
        correct_answer,
        difficulty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz(v: Value) -> Result<QuizQuestion, RecordRejection> {
        quiz_question_from_json(&v)
    }

    #[test]
    fn flashcard_requires_both_fields() {
        assert!(flashcard_from_json(&json!({"question": "Q?", "answer": "A"})).is_ok());
        assert!(flashcard_from_json(&json!({"question": "Q?"})).is_err());
        assert!(flashcard_from_json(&json!({"question": "  ", "answer": "A"})).is_err());
        assert!(flashcard_from_json(&json!({"question": "Q?", "answer": 4})).is_err());
        assert!(flashcard_from_json(&json!(["Q?", "A"])).is_err());
    }

    #[test]
    fn flashcard_fields_are_trimmed() {
        let card = flashcard_from_json(&json!({"question": " Q? ", "answer": "\tA\n"})).expect("valid");
        assert_eq!(card.question, "Q?");
        assert_eq!(card.answer, "A");
    }

    #[test]
    fn quiz_question_enumerations_are_exact() {
        let base = json!({
            "question": "What?",
            "options": {"A": "1", "B": "2", "C": "3", "D": "4"},
            "correct_answer": "C",
            "difficulty": "Hard"
        });
        let q = quiz(base.clone()).expect("valid");
        assert_eq!(q.correct_answer, OptionLabel::C);
        assert_eq!(q.difficulty, Difficulty::Hard);

        let mut bad = base.clone();
        bad["correct_answer"] = json!("E");
        assert_eq!(quiz(bad).unwrap_err().code, "QUIZ_ANSWER_INVALID");

        let mut bad = base.clone();
        bad["correct_answer"] = json!("c");
        assert!(quiz(bad).is_err());

        let mut bad = base.clone();
        bad["difficulty"] = json!("hard");
        assert_eq!(quiz(bad).unwrap_err().code, "QUIZ_DIFFICULTY_INVALID");

        let mut bad = base;
        bad["options"] = json!({"A": "1", "B": "2", "C": "3"});
        assert_eq!(quiz(bad).unwrap_err().code, "QUIZ_OPTION_MISSING");
    }

    #[test]
    fn blank_option_text_counts_as_missing() {
        let err = quiz(json!({
            "question": "q",
            "options": {"A": "1", "B": "  ", "C": "3", "D": "4"},
            "correct_answer": "A",
            "difficulty": "Easy"
        }))
        .unwrap_err();
        assert_eq!(err.code, "QUIZ_OPTION_MISSING");
    }

    #[test]
    fn quiz_question_ignores_extra_options() {
        let q = quiz(json!({
            "question": "What?",
            "options": {"A": "1", "B": "2", "C": "3", "D": "4", "E": "5"},
            "correct_answer": "A",
            "difficulty": "Easy"
        }))
        .expect("valid");
        assert_eq!(q.options.d, "4");
    }
}
