//! Error types for the document QA service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for fin-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned when a question arrives before anything has been indexed
pub const NO_INDEX_MESSAGE: &str = "No documents indexed yet. Upload or fetch a document first.";

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote document could not be downloaded
    #[error("Download failed: {0}")]
    Download(String),

    /// Uploaded file was rejected before being written
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// A question was submitted before any index was built
    #[error("{}", NO_INDEX_MESSAGE)]
    NoIndex,

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Language model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Failure anywhere in the question-answering chain, reported verbatim
    #[error("{0}")]
    Pipeline(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a download error
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap any error raised while answering a question
    pub fn pipeline(err: impl std::fmt::Display) -> Self {
        Self::Pipeline(err.to_string())
    }

    /// HTTP status and machine-readable type for this error
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Download(_) => (StatusCode::BAD_REQUEST, "download_error"),
            Error::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "invalid_upload"),
            Error::NoIndex => (StatusCode::BAD_REQUEST, "no_index"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Llm(_) => (StatusCode::INTERNAL_SERVER_ERROR, "llm_error"),
            Error::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "pipeline_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{} ({}): {}", status, error_type, message);
        } else {
            tracing::warn!("{} ({}): {}", status, error_type, message);
        }

        let body = Json(json!({
            "detail": message,
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(Error::NoIndex.status_and_type().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::download("connection refused").status_and_type().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidUpload("empty filename".into()).status_and_type().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_pipeline_error_keeps_raw_message() {
        let err = Error::pipeline(Error::llm("quota exceeded"));
        assert_eq!(err.to_string(), "LLM error: quota exceeded");
        assert_eq!(err.status_and_type().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_download_message_prefix() {
        let err = Error::download("404 Not Found");
        assert_eq!(err.to_string(), "Download failed: 404 Not Found");
    }
}
