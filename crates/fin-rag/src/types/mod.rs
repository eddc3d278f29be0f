//! Core types for the document QA service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType};
pub use query::{FetchParams, QuestionParams};
pub use response::{AnswerResponse, IngestResponse, WelcomeResponse};
