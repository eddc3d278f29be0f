//! Response types for the HTTP API

use serde::{Deserialize, Serialize};

/// Response for fetch and upload endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Human-readable outcome
    pub message: String,
    /// Where the document lives on disk
    pub file_path: String,
}

impl IngestResponse {
    pub const FETCHED: &'static str = "File saved and indexed successfully";
    pub const UPLOADED: &'static str = "File uploaded and indexed successfully";
    pub const ALREADY_EXISTS: &'static str = "File already exists";

    pub fn new(message: &str, file_path: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            file_path: file_path.into(),
        }
    }
}

/// Response for the question endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Raw model output
    pub result: String,
}

/// Response for the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}
