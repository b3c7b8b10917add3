pub mod corpus;
pub mod embeddings;
pub mod extract;
pub mod generate;
pub mod llm;
pub mod ollama;
pub mod prompts;
pub mod quota;
pub mod retrieve;
