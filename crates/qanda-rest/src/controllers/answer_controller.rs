//! Answer controller.

use crate::{
    responses::{ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use qanda_core::{Answer, AnswerId, QandaError};

/// Creates the answer router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:id", get(get_answer))
}

/// Get a single answer.
#[utoipa::path(
    get,
    path = "/api/answers/{id}",
    tag = "answers",
    params(("id" = i64, Path, description = "Answer id")),
    responses(
        (status = 200, description = "The answer", body = Answer),
        (status = 404, description = "No such answer", body = qanda_core::ErrorResponse)
    )
)]
pub async fn get_answer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Answer> {
    let id = id
        .parse::<i64>()
        .map(AnswerId)
        .map_err(|_| AppError(QandaError::Validation(format!("Invalid answer id: {id}"))))?;
    ok(state.question_service.get_answer(id).await?)
}
