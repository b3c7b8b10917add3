use serde::{Deserialize, Serialize};
use study_core::error::{codes, AppError};

use super::Embedder;
use crate::ollama::OllamaClient;

// Chunking keeps inputs far below this; the cap only guards pathological text.
const MAX_INPUT_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

fn truncate_on_char_boundary(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = truncate_on_char_boundary(input, MAX_INPUT_BYTES);

        let url = format!("{}/api/embeddings", self.client.base_url());
        let req = EmbeddingsRequest {
            model: &self.model,
            prompt,
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(codes::AI_EMBEDDINGS_FAILED, "Failed to encode embeddings request")
                .with_details(e.to_string())
        })?;
        let resp = ureq::post(&url)
            .timeout(self.client.request_timeout())
            .send_json(body);

        match resp {
            Ok(r) => {
                let v: EmbeddingsResponse = r.into_json().map_err(|e| {
                    AppError::new(codes::AI_EMBEDDINGS_FAILED, "Failed to decode embeddings response")
                        .with_details(e.to_string())
                })?;
                if v.embedding.is_empty() {
                    return Err(AppError::new(
                        codes::AI_EMBEDDINGS_FAILED,
                        "Embeddings response was empty",
                    )
                    .with_details(format!("model={}", self.model)));
                }
                Ok(v.embedding)
            }
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                codes::AI_EMBEDDINGS_FAILED,
                "Embeddings request failed",
            )
            .with_details(format!("model={}; status={status}", self.model))
            .with_retryable(status >= 500)),
            Err(e) => Err(
                AppError::new(codes::AI_EMBEDDINGS_FAILED, "Failed to call embeddings endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_on_char_boundary;

    #[test]
    fn truncation_respects_utf8() {
        let s = "aé"; // 'é' is two bytes
        assert_eq!(truncate_on_char_boundary(s, 2), "a");
        assert_eq!(truncate_on_char_boundary(s, 3), "aé");
    }
}
