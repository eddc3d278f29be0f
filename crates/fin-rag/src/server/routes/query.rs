//! Question endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AnswerResponse, QuestionParams};

/// GET /submit/?question=... - Answer a question from the indexed documents
pub async fn submit_question(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Json<AnswerResponse>> {
    tracing::info!("Question: \"{}\"", params.question);

    let result = state.answer(&params.question).await?;

    Ok(Json(AnswerResponse { result }))
}
