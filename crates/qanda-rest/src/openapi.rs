//! OpenAPI documentation configuration.

use qanda_core::{Answer, AnswerId, ErrorResponse, FieldError, Question, QuestionId};
use qanda_service::{CreateAnswerRequest, CreateQuestionRequest, UpdateQuestionRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the Qanda API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Qanda API",
        version = "1.0.0",
        description = "Questions, answers, and live answer notifications",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        crate::controllers::question_controller::list_questions,
        crate::controllers::question_controller::unanswered_questions,
        crate::controllers::question_controller::get_question,
        crate::controllers::question_controller::create_question,
        crate::controllers::question_controller::update_question,
        crate::controllers::question_controller::delete_question,
        crate::controllers::question_controller::post_answer,
        crate::controllers::answer_controller::get_answer,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            QuestionId,
            AnswerId,
            Question,
            Answer,
            ErrorResponse,
            FieldError,
            CreateQuestionRequest,
            UpdateQuestionRequest,
            CreateAnswerRequest,
            crate::controllers::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "questions", description = "Question and answer endpoints"),
        (name = "answers", description = "Answer lookup"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Security addon for JWT Bearer authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Bearer token issued by the identity provider"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_question_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/questions"));
        assert!(doc.paths.paths.contains_key("/api/questions/{id}"));
        assert!(doc.paths.paths.contains_key("/api/questions/answer"));
    }
}
