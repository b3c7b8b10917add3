use study_core::error::AppError;

/// Text embedding bound to one named model.
pub trait Embedder {
    fn model(&self) -> &str;
    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod ollama_embed;
