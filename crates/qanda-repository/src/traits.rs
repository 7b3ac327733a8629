//! Repository trait definitions.

use async_trait::async_trait;
use qanda_core::{
    Answer, AnswerId, NewAnswer, NewQuestion, Page, PageRequest, QandaResult, Question, QuestionId,
    QuestionUpdate,
};

/// Question repository trait.
///
/// Every operation may fail with a transient I/O error; callers propagate it
/// rather than retry.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Finds a question with its answers in creation order.
    async fn get_question(&self, id: QuestionId) -> QandaResult<Option<Question>>;

    /// Checks whether a question exists.
    async fn question_exists(&self, id: QuestionId) -> QandaResult<bool>;

    /// Finds a single answer.
    async fn get_answer(&self, id: AnswerId) -> QandaResult<Option<Answer>>;

    /// Lists all questions, newest first, without answers.
    async fn list_questions(&self) -> QandaResult<Vec<Question>>;

    /// Lists all questions, newest first, with their answers.
    async fn list_questions_with_answers(&self) -> QandaResult<Vec<Question>>;

    /// Searches titles and content, case-insensitively, one page at a time.
    async fn search_questions(&self, search: &str, page: PageRequest) -> QandaResult<Page<Question>>;

    /// Lists questions that have no answers, newest first.
    async fn unanswered_questions(&self) -> QandaResult<Vec<Question>>;

    /// Stores a new question and returns it with its assigned id.
    async fn create_question(&self, question: NewQuestion) -> QandaResult<Question>;

    /// Replaces title and content. Returns `None` if the question is gone.
    async fn update_question(&self, id: QuestionId, update: QuestionUpdate) -> QandaResult<Option<Question>>;

    /// Deletes a question and its answers. Returns false if it did not exist.
    async fn delete_question(&self, id: QuestionId) -> QandaResult<bool>;

    /// Stores a new answer.
    async fn create_answer(&self, answer: NewAnswer) -> QandaResult<Answer>;
}
