//! Question and answer request DTOs.

use qanda_core::rules::not_blank;
use qanda_core::{PageRequest, QuestionId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for listing questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive text matched against title and content.
    pub search: Option<String>,
    /// Include answers in each listed question. Ignored when searching.
    pub include_answers: bool,
    /// 1-based page number for searches.
    pub page: Option<u32>,
    /// Page size for searches.
    pub page_size: Option<u32>,
}

impl ListQuery {
    /// The search term, if one was given and is not blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Paging for searches, with defaults and bounds applied.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

/// Request to post a new question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(
        length(max = 100, message = "Title must be at most 100 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

/// Request to edit a question. Missing, empty or blank fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,
}

/// Request to answer a question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerRequest {
    #[schema(value_type = i64)]
    pub question_id: QuestionId,

    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use qanda_core::{QandaError, ValidateExt};

    #[test]
    fn test_list_query_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.search_term(), None);
        assert!(!query.include_answers);
        assert_eq!(query.page_request(), PageRequest::new(1, PageRequest::DEFAULT_SIZE));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ListQuery {
            search: Some("   ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn test_create_question_validation() {
        let ok = CreateQuestionRequest {
            title: "Why is the sky blue?".to_string(),
            content: "Asking for a friend".to_string(),
        };
        assert!(ok.validate_request().is_ok());

        let bad = CreateQuestionRequest {
            title: "x".repeat(101),
            content: "  ".to_string(),
        };
        match bad.validate_request() {
            Err(QandaError::ValidationErrors { fields, .. }) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["content", "title"]);
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_title_of_exactly_max_length_is_accepted() {
        let request = CreateQuestionRequest {
            title: "x".repeat(100),
            content: "body".to_string(),
        };
        assert!(request.validate_request().is_ok());
    }

    #[test]
    fn test_update_allows_missing_fields() {
        assert!(UpdateQuestionRequest::default().validate_request().is_ok());
        let long = UpdateQuestionRequest {
            title: Some("x".repeat(101)),
            content: None,
        };
        assert!(long.validate_request().is_err());
    }

    #[test]
    fn test_answer_request_wire_names() {
        let request: CreateAnswerRequest =
            serde_json::from_str(r#"{"questionId": 3, "content": "Because"}"#).unwrap();
        assert_eq!(request.question_id, QuestionId(3));
    }
}
