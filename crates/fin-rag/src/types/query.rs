//! Request parameter types

use serde::{Deserialize, Serialize};

/// Query parameters for `POST /fetch_document/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchParams {
    /// URL of the document to download
    pub url: String,
}

/// Query parameters for `GET /submit/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionParams {
    /// Question for the indexed documents
    pub question: String,
}
