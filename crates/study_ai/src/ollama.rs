use std::time::Duration;

use study_core::error::{codes, AppError};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    request_timeout: Duration,
}

impl OllamaClient {
    /// Create a client for an Ollama server at `base_url` (`http(s)://host[:port]`, no path).
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let invalid = |why: &str| {
            AppError::new(codes::AI_OLLAMA_URL_INVALID, "Ollama base URL is invalid")
                .with_details(format!("base_url={base_url}; reason={why}"))
        };

        let rest = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .ok_or_else(|| invalid("scheme must be http or https"))?;
        if rest.is_empty() {
            return Err(invalid("missing host"));
        }
        if rest.contains('/') || rest.contains('@') || rest.contains('?') {
            return Err(invalid("URL must not contain a path, credentials or query"));
        }
        if let Some((host, port)) = rest.rsplit_once(':') {
            // IPv6 literals are not supported.
            if host.is_empty() || host.contains(':') {
                return Err(invalid("malformed host"));
            }
            match port.parse::<u16>() {
                Ok(p) if p > 0 => {}
                _ => return Err(invalid("port must be 1-65535")),
            }
        }
        if request_timeout.is_zero() {
            return Err(invalid("request timeout must be positive"));
        }

        Ok(Self {
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upper bound for a single embeddings or generate call.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new(codes::AI_OLLAMA_UNREACHABLE, "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                codes::AI_OLLAMA_UNREACHABLE,
                "Failed to reach Ollama",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
