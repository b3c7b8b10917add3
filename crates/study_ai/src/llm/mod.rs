use serde::Serialize;
use study_core::error::{codes, AppError};
use tracing::warn;

pub mod ollama_llm;

/// Decoding options forwarded to the generation backend.
///
/// `device` is a hardware hint some backends reject; see [`generate_with_fallback`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl GenerateOptions {
    pub fn with_device(mut self, device: Option<&str>) -> Self {
        self.device = device.map(str::to_string);
        self
    }

    pub fn without_device(&self) -> Self {
        Self {
            device: None,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.device.is_none() && self.temperature.is_none() && self.num_predict.is_none()
    }
}

/// Text generation bound to one named model. Output is free text and never trusted.
pub trait Llm {
    fn model(&self) -> &str;
    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, AppError>;
}

/// Generate once; if the backend rejects the `device` hint, retry exactly once without it.
pub fn generate_with_fallback(
    llm: &dyn Llm,
    prompt: &str,
    options: &GenerateOptions,
) -> Result<String, AppError> {
    match llm.generate(prompt, options) {
        Err(e) if e.is(codes::AI_GENERATE_OPTION_REJECTED) && options.device.is_some() => {
            warn!(
                model = llm.model(),
                error = %e,
                "generation backend rejected the device option; retrying without it"
            );
            llm.generate(prompt, &options.without_device())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct RejectsDevice {
        seen: RefCell<Vec<GenerateOptions>>,
    }

    impl Llm for RejectsDevice {
        fn model(&self) -> &str {
            "mock"
        }

        fn generate(&self, _prompt: &str, options: &GenerateOptions) -> Result<String, AppError> {
            self.seen.borrow_mut().push(options.clone());
            if options.device.is_some() {
                return Err(AppError::new(codes::AI_GENERATE_OPTION_REJECTED, "device unsupported"));
            }
            Ok("ok".to_string())
        }
    }

    struct AlwaysFails {
        calls: RefCell<usize>,
    }

    impl Llm for AlwaysFails {
        fn model(&self) -> &str {
            "mock"
        }

        fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, AppError> {
            *self.calls.borrow_mut() += 1;
            Err(AppError::new(codes::AI_GENERATE_OPTION_REJECTED, "nope"))
        }
    }

    #[test]
    fn strips_device_and_retries_once() {
        let llm = RejectsDevice {
            seen: RefCell::new(Vec::new()),
        };
        let opts = GenerateOptions {
            temperature: Some(0.2),
            ..Default::default()
        }
        .with_device(Some("cuda"));
        let out = generate_with_fallback(&llm, "p", &opts).expect("retry succeeds");
        assert_eq!(out, "ok");
        let seen = llm.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].device, None);
        assert_eq!(seen[1].temperature, Some(0.2));
    }

    #[test]
    fn propagates_after_single_retry() {
        let llm = AlwaysFails {
            calls: RefCell::new(0),
        };
        let opts = GenerateOptions::default().with_device(Some("cuda"));
        let err = generate_with_fallback(&llm, "p", &opts).unwrap_err();
        assert_eq!(err.code, codes::AI_GENERATE_OPTION_REJECTED);
        assert_eq!(*llm.calls.borrow(), 2);
    }

    #[test]
    fn no_retry_without_device() {
        let llm = AlwaysFails {
            calls: RefCell::new(0),
        };
        assert!(generate_with_fallback(&llm, "p", &GenerateOptions::default()).is_err());
        assert_eq!(*llm.calls.borrow(), 1);
    }
}
