use study_core::config::validate_window;
use study_core::error::AppError;

use super::model::Chunk;

/// Split `text` on whitespace into windows of `size` words, each starting `size - overlap`
/// words after the previous one.
///
/// Windowing stops with the first window that reaches the end of the text, so for `N > 0`
/// words there are `max(1, ceil((N - overlap) / (size - overlap)))` chunks and consecutive
/// chunks share exactly `overlap` words. The last chunk may be shorter than `size`.
pub fn chunk_words(
    text: &str,
    size: usize,
    overlap: usize,
    source: &str,
) -> Result<Vec<Chunk>, AppError> {
    validate_window(size, overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = size - overlap;
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut index: u32 = 0;

    while start < words.len() {
        let end = (start + size).min(words.len());
        out.push(Chunk {
            text: words[start..end].join(" "),
            index,
            source: source.to_string(),
        });
        if end == words.len() {
            break;
        }
        index += 1;
        start += step;
    }

    Ok(out)
}
