//! Document acquisition endpoints: fetch by URL and multipart upload

use axum::{
    extract::{Multipart, Query, State},
    Json,
};

use crate::acquisition::UploadOutcome;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{FetchParams, IngestResponse};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "upload_file";

/// POST /fetch_document/?url=... - Download a document and rebuild the index
pub async fn fetch_document(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Json<IngestResponse>> {
    let path = state.documents().fetch(&params.url).await?;

    state.rebuild_index().await?;

    Ok(Json(IngestResponse::new(
        IngestResponse::FETCHED,
        path.display().to_string(),
    )))
}

/// POST /upload_document/ - Store an uploaded document and rebuild the index
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::InvalidUpload(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("Failed to read file: {}", e)))?;

        tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

        return match state.documents().accept_upload(&filename, &data).await? {
            UploadOutcome::AlreadyExists(path) => Ok(Json(IngestResponse::new(
                IngestResponse::ALREADY_EXISTS,
                path.display().to_string(),
            ))),
            UploadOutcome::Saved(path) => {
                state.rebuild_index().await?;
                Ok(Json(IngestResponse::new(
                    IngestResponse::UPLOADED,
                    path.display().to_string(),
                )))
            }
        };
    }

    Err(Error::InvalidUpload(format!(
        "missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}
