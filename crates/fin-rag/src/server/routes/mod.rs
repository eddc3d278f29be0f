//! API routes for the QA server

pub mod ingest;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::WelcomeResponse;

/// Greeting returned by `/`
pub const WELCOME_MESSAGE: &str =
    "Welcome to the Document Fetcher API. Use /fetch_document or /upload_document";

/// Build all API routes; each is reachable with and without the trailing slash
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/fetch_document/", post(ingest::fetch_document))
        .route("/fetch_document", post(ingest::fetch_document))
        // Uploads get a larger body limit
        .route(
            "/upload_document/",
            post(ingest::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/upload_document",
            post(ingest::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/submit/", get(query::submit_question))
        .route("/submit", get(query::submit_question))
}

/// GET / - Welcome message
async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}
