pub fn flashcard_prompt(chunk: &str, count: usize) -> String {
    format!(
        r#"Based on the following text, create exactly {count} flashcards in JSON format.
Each flashcard must have a 'question' and 'answer' field.

IMPORTANT INSTRUCTIONS:
- The original text may be written in first person (using "I", "me", "my").
- DO NOT use first-person or second-person pronouns in the flashcards.
- Instead, ALWAYS rewrite pronouns as explicit nouns:
    - "I", "me", "my" -> "the narrator"
    - "they", "them" -> use the specific group if identifiable
- Write all questions and answers in a neutral, third-person study-guide tone.
- Make questions clear and factual.
- Make answers concise and accurate.
- Do not add opinions or reinterpretations.
- Return ONLY a valid JSON array.

Text:
{chunk}

Return the flashcards in this exact JSON structure:
[
  {{"question": "What is...?", "answer": "..."}},
  {{"question": "How does...?", "answer": "..."}}
]
"#
    )
}

pub fn quiz_prompt(chunk: &str, count: usize) -> String {
    format!(
        r#"Based on the following text, create exactly {count} multiple choice quiz questions.
Each question should have:
- A clear question text
- 4 answer options (A, B, C, D)
- The correct answer letter
- A difficulty level (Easy, Medium, or Hard)

Return the response in the following JSON format ONLY:
[
  {{
    "question": "What is...?",
    "options": {{"A": "...", "B": "...", "C": "...", "D": "..."}},
    "correct_answer": "A",
    "difficulty": "Easy"
  }},
  {{
    "question": "How does...?",
    "options": {{"A": "...", "B": "...", "C": "...", "D": "..."}},
    "correct_answer": "B",
    "difficulty": "Medium"
  }}
]

Text:
{chunk}

JSON Array:"#
    )
}
