use serde::{Deserialize, Serialize};
use study_core::error::{codes, AppError};

use super::{GenerateOptions, Llm};
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a GenerateOptions>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// A 4xx whose body names the hint is the backend refusing the option, not the request.
fn is_option_rejection(status: u16, body: &str, options: &GenerateOptions) -> bool {
    (400..500).contains(&status)
        && options.device.is_some()
        && body.to_lowercase().contains("device")
}

impl Llm for OllamaLlm {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: if options.is_empty() { None } else { Some(options) },
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(codes::AI_GENERATION_FAILED, "Failed to encode generate request")
                .with_details(e.to_string())
        })?;

        let resp = ureq::post(&url)
            .timeout(self.client.request_timeout())
            .send_json(body);

        match resp {
            Ok(r) => {
                let v: GenerateResponse = r.into_json().map_err(|e| {
                    AppError::new(codes::AI_GENERATION_FAILED, "Failed to decode generate response")
                        .with_details(e.to_string())
                })?;
                if v.response.trim().is_empty() {
                    return Err(AppError::new(
                        codes::AI_GENERATION_FAILED,
                        "Generate response was empty",
                    )
                    .with_details(format!("model={}", self.model)));
                }
                Ok(v.response)
            }
            Err(ureq::Error::Status(status, r)) => {
                let text = r.into_string().unwrap_or_default();
                if is_option_rejection(status, &text, options) {
                    return Err(AppError::new(
                        codes::AI_GENERATE_OPTION_REJECTED,
                        "Generation backend rejected an option",
                    )
                    .with_details(format!("option=device; status={status}; body={text}")));
                }
                Err(AppError::new(codes::AI_GENERATION_FAILED, "Generate request failed")
                    .with_details(format!("model={}; status={status}; body={text}", self.model))
                    .with_retryable(status >= 500))
            }
            // Transport errors include request timeouts.
            Err(e) => Err(
                AppError::new(codes::AI_GENERATION_FAILED, "Failed to call generate endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
