//! Prompt construction for answer generation

pub mod prompt;

pub use prompt::{PromptBuilder, QA_PROMPT_TEMPLATE};
