//! Question controller.

use crate::{
    extractors::{AuthenticatedUser, OptionalUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResponse},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use qanda_core::{Answer, QandaError, Question, QuestionId};
use qanda_service::{CreateAnswerRequest, CreateQuestionRequest, ListQuery, UpdateQuestionRequest};
use tracing::debug;

/// Creates the question router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/unanswered", get(unanswered_questions))
        .route("/answer", post(post_answer))
        .route("/:id", get(get_question).put(update_question).delete(delete_question))
}

/// List questions, or search them.
#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "questions",
    params(ListQuery),
    responses(
        (status = 200, description = "Questions, newest first", body = [Question])
    )
)]
pub async fn list_questions(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Question>> {
    ok(state.question_service.list_questions(query).await?)
}

/// List questions without answers.
#[utoipa::path(
    get,
    path = "/api/questions/unanswered",
    tag = "questions",
    responses(
        (status = 200, description = "Unanswered questions, newest first", body = [Question])
    )
)]
pub async fn unanswered_questions(State(state): State<AppState>) -> ApiResult<Vec<Question>> {
    ok(state.question_service.unanswered_questions().await?)
}

/// Get a question with its answers.
#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    tag = "questions",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "The question", body = Question),
        (status = 404, description = "No such question", body = qanda_core::ErrorResponse)
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    viewer: OptionalUser,
    Path(id): Path<String>,
) -> ApiResult<Question> {
    let id = parse_question_id(&id)?;
    debug!(
        question_id = %id,
        viewer = viewer.as_ref().map_or("anonymous", |v| v.user_id.as_str()),
        "Get question request"
    );
    ok(state.question_service.get_question(id).await?)
}

/// Post a question.
#[utoipa::path(
    post,
    path = "/api/questions",
    tag = "questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Invalid request", body = qanda_core::ErrorResponse),
        (status = 401, description = "Not signed in", body = qanda_core::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateQuestionRequest>,
) -> Result<CreatedResponse<Question>, AppError> {
    debug!(user_id = %user.user_id, "Create question request");

    let saved = state.question_service.create_question(&user, request).await?;
    created(&format!("/api/questions/{}", saved.id), saved)
}

/// Edit a question.
#[utoipa::path(
    put,
    path = "/api/questions/{id}",
    tag = "questions",
    params(("id" = i64, Path, description = "Question id")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "Caller is not the author", body = qanda_core::ErrorResponse),
        (status = 404, description = "No such question", body = qanda_core::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateQuestionRequest>,
) -> ApiResult<Question> {
    let id = parse_question_id(&id)?;
    debug!(question_id = %id, user_id = %user.user_id, "Update question request");

    ok(state.question_service.update_question(&user, id, request).await?)
}

/// Delete a question and its answers.
#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    tag = "questions",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Caller is not the author", body = qanda_core::ErrorResponse),
        (status = 404, description = "No such question", body = qanda_core::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_question_id(&id)?;
    debug!(question_id = %id, user_id = %user.user_id, "Delete question request");

    state.question_service.delete_question(&user, id).await?;
    Ok(no_content())
}

/// Answer a question.
#[utoipa::path(
    post,
    path = "/api/questions/answer",
    tag = "questions",
    request_body = CreateAnswerRequest,
    responses(
        (status = 201, description = "Answer posted", body = Answer),
        (status = 404, description = "No such question", body = qanda_core::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn post_answer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateAnswerRequest>,
) -> Result<CreatedResponse<Answer>, AppError> {
    debug!(question_id = %request.question_id, user_id = %user.user_id, "Post answer request");

    let saved = state.question_service.post_answer(&user, request).await?;
    created(&format!("/api/answers/{}", saved.id), saved)
}

/// Parses a question id from a path segment.
pub(crate) fn parse_question_id(id: &str) -> Result<QuestionId, AppError> {
    id.parse()
        .map_err(|_| AppError(QandaError::Validation(format!("Invalid question id: {id}"))))
}
