//! Question and answer entities.

use crate::{AnswerId, Entity, Identity, QuestionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-submitted question with its answers in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier assigned by the store.
    #[serde(rename = "questionId")]
    pub id: QuestionId,

    /// Title, 1 to 100 characters.
    pub title: String,

    /// Body of the question.
    pub content: String,

    /// Subject identifier of the author.
    pub user_id: String,

    /// Display name of the author.
    pub user_name: String,

    /// Creation timestamp.
    pub created: DateTime<Utc>,

    /// Answers ordered by creation. Empty on list responses that omit answers.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Question {
    /// Returns true if the given identity authored this question.
    #[must_use]
    pub fn is_authored_by(&self, identity: &Identity) -> bool {
        identity.owns(&self.user_id)
    }

    /// Returns true if the question has no answers.
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.answers.is_empty()
    }

    /// Returns a copy of this question without its answers.
    #[must_use]
    pub fn summary(&self) -> Self {
        Self {
            answers: Vec::new(),
            ..self.clone()
        }
    }
}

impl Entity<QuestionId> for Question {
    fn id(&self) -> QuestionId {
        self.id
    }
}

/// A response to exactly one question. Answers are immutable once posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(rename = "answerId")]
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    pub created: DateTime<Utc>,
}

impl Entity<AnswerId> for Answer {
    fn id(&self) -> AnswerId {
        self.id
    }
}

/// Data required to store a new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    pub created: DateTime<Utc>,
}

impl NewQuestion {
    /// Creates a new question authored by `identity`, stamped with the current time.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>, identity: &Identity) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id: identity.user_id.clone(),
            user_name: identity.user_name.clone(),
            created: Utc::now(),
        }
    }
}

/// Replacement title and content for an existing question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionUpdate {
    pub title: String,
    pub content: String,
}

impl QuestionUpdate {
    /// Builds an update where empty or blank values keep the current ones.
    #[must_use]
    pub fn merge(current: &Question, title: Option<&str>, content: Option<&str>) -> Self {
        let pick = |new: Option<&str>, old: &str| match new {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => old.to_string(),
        };
        Self {
            title: pick(title, &current.title),
            content: pick(content, &current.content),
        }
    }
}

/// Data required to store a new answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    pub created: DateTime<Utc>,
}

impl NewAnswer {
    /// Creates a new answer authored by `identity`, stamped with the current time.
    #[must_use]
    pub fn new(question_id: QuestionId, content: impl Into<String>, identity: &Identity) -> Self {
        Self {
            question_id,
            content: content.into(),
            user_id: identity.user_id.clone(),
            user_name: identity.user_name.clone(),
            created: Utc::now(),
        }
    }
}
