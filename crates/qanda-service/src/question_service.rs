//! Question service trait definition.

use crate::dto::{CreateAnswerRequest, CreateQuestionRequest, ListQuery, UpdateQuestionRequest};
use async_trait::async_trait;
use qanda_core::{Answer, AnswerId, Identity, QandaResult, Question, QuestionId};

/// Question and answer use cases.
#[async_trait]
pub trait QuestionService: Send + Sync {
    /// Lists questions, or one page of search results when a search term is given.
    async fn list_questions(&self, query: ListQuery) -> QandaResult<Vec<Question>>;

    /// Lists questions that have no answers yet.
    async fn unanswered_questions(&self) -> QandaResult<Vec<Question>>;

    /// Gets a question with its answers.
    async fn get_question(&self, id: QuestionId) -> QandaResult<Question>;

    /// Posts a new question as `author`.
    async fn create_question(&self, author: &Identity, request: CreateQuestionRequest) -> QandaResult<Question>;

    /// Edits a question. Only its author may do so.
    async fn update_question(
        &self,
        caller: &Identity,
        id: QuestionId,
        request: UpdateQuestionRequest,
    ) -> QandaResult<Question>;

    /// Deletes a question and its answers. Only its author may do so.
    async fn delete_question(&self, caller: &Identity, id: QuestionId) -> QandaResult<()>;

    /// Answers a question and pushes the updated question to its followers.
    async fn post_answer(&self, author: &Identity, request: CreateAnswerRequest) -> QandaResult<Answer>;

    /// Gets a single answer.
    async fn get_answer(&self, id: AnswerId) -> QandaResult<Answer>;
}
