//! MySQL question repository implementation.

use crate::{traits::QuestionRepository, DatabasePool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qanda_core::{
    Answer, AnswerId, NewAnswer, NewQuestion, Page, PageRequest, QandaError, QandaResult, Question,
    QuestionId, QuestionUpdate,
};
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const QUESTION_COLUMNS: &str = "q.id, q.title, q.content, q.user_id, q.user_name, q.created";
const ANSWER_COLUMNS: &str = "a.id, a.question_id, a.content, a.user_id, a.user_name, a.created";

/// MySQL question repository implementation.
#[derive(Clone)]
pub struct MySqlQuestionRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlQuestionRepository {
    /// Creates a new MySQL question repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn fetch_question_rows(&self, sql: &str) -> QandaResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(sql)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn answers_for(&self, id: QuestionId) -> QandaResult<Vec<Answer>> {
        let rows = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers a WHERE a.question_id = ? ORDER BY a.created, a.id"
        ))
        .bind(id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;
        Ok(rows.into_iter().map(Answer::from).collect())
    }
}

/// Database row representation of a question.
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    title: String,
    content: String,
    user_id: String,
    user_name: String,
    created: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: QuestionId(row.id),
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            user_name: row.user_name,
            created: row.created,
            answers: Vec::new(),
        }
    }
}

/// Database row representation of an answer.
#[derive(Debug, FromRow)]
struct AnswerRow {
    id: i64,
    question_id: i64,
    content: String,
    user_id: String,
    user_name: String,
    created: DateTime<Utc>,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: AnswerId(row.id),
            question_id: QuestionId(row.question_id),
            content: row.content,
            user_id: row.user_id,
            user_name: row.user_name,
            created: row.created,
        }
    }
}

/// Escapes `LIKE` wildcards so the search term matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl QuestionRepository for MySqlQuestionRepository {
    async fn get_question(&self, id: QuestionId) -> QandaResult<Option<Question>> {
        debug!(question_id = %id, "Finding question");

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = ?"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut question = Question::from(row);
        question.answers = self.answers_for(id).await?;
        Ok(Some(question))
    }

    async fn question_exists(&self, id: QuestionId) -> QandaResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ?")
            .bind(id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count > 0)
    }

    async fn get_answer(&self, id: AnswerId) -> QandaResult<Option<Answer>> {
        debug!(answer_id = %id, "Finding answer");

        let row = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers a WHERE a.id = ?"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Answer::from))
    }

    async fn list_questions(&self) -> QandaResult<Vec<Question>> {
        debug!("Listing questions");
        self.fetch_question_rows(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q ORDER BY q.created DESC, q.id DESC"
        ))
        .await
    }

    async fn list_questions_with_answers(&self) -> QandaResult<Vec<Question>> {
        debug!("Listing questions with answers");

        let mut questions = self.list_questions().await?;
        let answers = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers a ORDER BY a.created, a.id"
        ))
        .fetch_all(self.pool.inner())
        .await?;

        let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
        for row in answers {
            by_question.entry(row.question_id).or_default().push(Answer::from(row));
        }
        for question in &mut questions {
            if let Some(answers) = by_question.remove(&question.id.into_inner()) {
                question.answers = answers;
            }
        }
        Ok(questions)
    }

    async fn search_questions(&self, search: &str, page: PageRequest) -> QandaResult<Page<Question>> {
        debug!(search = %search, page = page.page, page_size = page.page_size, "Searching questions");

        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM questions WHERE title LIKE ? OR content LIKE ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(self.pool.inner())
        .await?;

        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            r"
            SELECT {QUESTION_COLUMNS}
            FROM questions q
            WHERE q.title LIKE ? OR q.content LIKE ?
            ORDER BY q.created DESC, q.id DESC
            LIMIT ? OFFSET ?
            "
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(to_i64(page.limit()))
        .bind(to_i64(page.offset()))
        .fetch_all(self.pool.inner())
        .await?;

        let items = rows.into_iter().map(Question::from).collect();
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or_default()))
    }

    async fn unanswered_questions(&self) -> QandaResult<Vec<Question>> {
        debug!("Listing unanswered questions");
        self.fetch_question_rows(&format!(
            r"
            SELECT {QUESTION_COLUMNS}
            FROM questions q
            WHERE NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)
            ORDER BY q.created DESC, q.id DESC
            "
        ))
        .await
    }

    async fn create_question(&self, question: NewQuestion) -> QandaResult<Question> {
        debug!(title = %question.title, "Saving new question");

        // MySQL doesn't support RETURNING, so insert then select
        let result = sqlx::query(
            "INSERT INTO questions (title, content, user_id, user_name, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&question.title)
        .bind(&question.content)
        .bind(&question.user_id)
        .bind(&question.user_name)
        .bind(question.created)
        .execute(self.pool.inner())
        .await?;

        let id = QuestionId(to_i64(result.last_insert_id()));
        self.get_question(id)
            .await?
            .ok_or_else(|| QandaError::Internal("Failed to fetch inserted question".to_string()))
    }

    async fn update_question(&self, id: QuestionId, update: QuestionUpdate) -> QandaResult<Option<Question>> {
        debug!(question_id = %id, "Updating question");

        sqlx::query("UPDATE questions SET title = ?, content = ? WHERE id = ?")
            .bind(&update.title)
            .bind(&update.content)
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        // rows_affected is zero for an unchanged row, so existence is re-read
        self.get_question(id).await
    }

    async fn delete_question(&self, id: QuestionId) -> QandaResult<bool> {
        debug!(question_id = %id, "Deleting question");

        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_answer(&self, answer: NewAnswer) -> QandaResult<Answer> {
        debug!(question_id = %answer.question_id, "Saving new answer");

        let result = sqlx::query(
            "INSERT INTO answers (question_id, content, user_id, user_name, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(answer.question_id.into_inner())
        .bind(&answer.content)
        .bind(&answer.user_id)
        .bind(&answer.user_name)
        .bind(answer.created)
        .execute(self.pool.inner())
        .await
        .map_err(|e| match &e {
            // The question was deleted after the caller checked for it.
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                QandaError::not_found("Question", answer.question_id)
            }
            _ => QandaError::from(e),
        })?;

        let id = AnswerId(to_i64(result.last_insert_id()));
        self.get_answer(id)
            .await?
            .ok_or_else(|| QandaError::Internal("Failed to fetch inserted answer".to_string()))
    }
}

impl std::fmt::Debug for MySqlQuestionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlQuestionRepository").finish_non_exhaustive()
    }
}
