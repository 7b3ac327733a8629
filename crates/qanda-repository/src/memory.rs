//! In-memory question repository.

use crate::traits::QuestionRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use qanda_core::{
    Answer, AnswerId, NewAnswer, NewQuestion, Page, PageRequest, QandaError, QandaResult, Question,
    QuestionId, QuestionUpdate,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct Store {
    next_question_id: i64,
    next_answer_id: i64,
    questions: BTreeMap<QuestionId, Question>,
}

impl Store {
    /// Questions ordered newest first.
    fn newest_first(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.values().collect();
        questions.sort_by_key(|q| Reverse((q.created, q.id)));
        questions
    }
}

/// Question repository held in process memory.
///
/// Ids are assigned from 1 upward in insertion order.
#[derive(Default)]
pub struct InMemoryQuestionRepository {
    store: RwLock<Store>,
}

impl InMemoryQuestionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored questions.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.store.read().questions.len()
    }
}

fn matches(question: &Question, needle: &str) -> bool {
    question.title.to_lowercase().contains(needle) || question.content.to_lowercase().contains(needle)
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn get_question(&self, id: QuestionId) -> QandaResult<Option<Question>> {
        debug!(question_id = %id, "Finding question");
        Ok(self.store.read().questions.get(&id).cloned())
    }

    async fn question_exists(&self, id: QuestionId) -> QandaResult<bool> {
        Ok(self.store.read().questions.contains_key(&id))
    }

    async fn get_answer(&self, id: AnswerId) -> QandaResult<Option<Answer>> {
        Ok(self
            .store
            .read()
            .questions
            .values()
            .flat_map(|q| q.answers.iter())
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_questions(&self) -> QandaResult<Vec<Question>> {
        Ok(self.store.read().newest_first().into_iter().map(Question::summary).collect())
    }

    async fn list_questions_with_answers(&self) -> QandaResult<Vec<Question>> {
        Ok(self.store.read().newest_first().into_iter().cloned().collect())
    }

    async fn search_questions(&self, search: &str, page: PageRequest) -> QandaResult<Page<Question>> {
        let needle = search.to_lowercase();
        let store = self.store.read();
        let found: Vec<&Question> = store
            .newest_first()
            .into_iter()
            .filter(|q| matches(q, &needle))
            .collect();

        let total = found.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = found
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(Question::summary)
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn unanswered_questions(&self) -> QandaResult<Vec<Question>> {
        Ok(self
            .store
            .read()
            .newest_first()
            .into_iter()
            .filter(|q| q.is_unanswered())
            .map(Question::summary)
            .collect())
    }

    async fn create_question(&self, question: NewQuestion) -> QandaResult<Question> {
        let mut store = self.store.write();
        store.next_question_id += 1;
        let id = QuestionId(store.next_question_id);
        let saved = Question {
            id,
            title: question.title,
            content: question.content,
            user_id: question.user_id,
            user_name: question.user_name,
            created: question.created,
            answers: Vec::new(),
        };
        store.questions.insert(id, saved.clone());
        debug!(question_id = %id, "Saved new question");
        Ok(saved)
    }

    async fn update_question(&self, id: QuestionId, update: QuestionUpdate) -> QandaResult<Option<Question>> {
        let mut store = self.store.write();
        Ok(store.questions.get_mut(&id).map(|question| {
            question.title = update.title;
            question.content = update.content;
            question.clone()
        }))
    }

    async fn delete_question(&self, id: QuestionId) -> QandaResult<bool> {
        Ok(self.store.write().questions.remove(&id).is_some())
    }

    async fn create_answer(&self, answer: NewAnswer) -> QandaResult<Answer> {
        let mut store = self.store.write();
        if !store.questions.contains_key(&answer.question_id) {
            return Err(QandaError::not_found("Question", answer.question_id));
        }
        store.next_answer_id += 1;
        let id = AnswerId(store.next_answer_id);
        let Some(question) = store.questions.get_mut(&answer.question_id) else {
            return Err(QandaError::not_found("Question", answer.question_id));
        };
        let saved = Answer {
            id,
            question_id: answer.question_id,
            content: answer.content,
            user_id: answer.user_id,
            user_name: answer.user_name,
            created: answer.created,
        };
        question.answers.push(saved.clone());
        Ok(saved)
    }
}
