//! Question service implementation.

use crate::cache::QuestionCache;
use crate::dto::{CreateAnswerRequest, CreateQuestionRequest, ListQuery, UpdateQuestionRequest};
use crate::question_service::QuestionService;
use crate::realtime::UpdateNotifier;
use async_trait::async_trait;
use qanda_core::{
    Answer, AnswerId, Identity, NewAnswer, NewQuestion, QandaError, QandaResult, Question, QuestionId,
    QuestionUpdate, ValidateExt,
};
use qanda_repository::QuestionRepository;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Question service backed by a repository, the shared cache, and the
/// update notifier.
pub struct QuestionServiceImpl<R: QuestionRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn QuestionCache>,
    notifier: Arc<dyn UpdateNotifier>,
}

impl<R: QuestionRepository + ?Sized + 'static> QuestionServiceImpl<R> {
    /// Creates a new question service.
    pub fn new(repository: Arc<R>, cache: Arc<dyn QuestionCache>, notifier: Arc<dyn UpdateNotifier>) -> Self {
        Self {
            repository,
            cache,
            notifier,
        }
    }

    /// Loads a question straight from the repository.
    async fn load(&self, id: QuestionId) -> QandaResult<Question> {
        self.repository
            .get_question(id)
            .await?
            .ok_or_else(|| QandaError::not_found("Question", id))
    }

    /// Loads a question and checks that `caller` wrote it.
    async fn load_owned(&self, caller: &Identity, id: QuestionId) -> QandaResult<Question> {
        let question = self.load(id).await?;
        if !question.is_authored_by(caller) {
            return Err(QandaError::forbidden("Only the author can change this question"));
        }
        Ok(question)
    }

    /// Runs a write affecting `id` on its own task and removes the cache entry
    /// afterwards, whatever the outcome. On success, followers are notified
    /// when `notify` is set.
    ///
    /// The caller awaits the task, but dropping the caller does not cancel it.
    async fn write<T, F>(&self, id: QuestionId, notify: bool, write: F) -> QandaResult<T>
    where
        T: Send + 'static,
        F: Future<Output = QandaResult<T>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let notifier = Arc::clone(&self.notifier);
        let task = tokio::spawn(async move {
            let result = write.await;
            cache.remove(id);
            if notify && result.is_ok() {
                notifier.notify_question_updated(id);
            }
            result
        });

        task.await
            .map_err(|e| QandaError::internal(format!("Write task for question {id} failed: {e}")))?
    }
}

#[async_trait]
impl<R: QuestionRepository + ?Sized + 'static> QuestionService for QuestionServiceImpl<R> {
    async fn list_questions(&self, query: ListQuery) -> QandaResult<Vec<Question>> {
        match query.search_term() {
            Some(search) => {
                let page = query.page_request();
                debug!(search = %search, page = page.page, page_size = page.page_size, "Searching questions");
                Ok(self.repository.search_questions(search, page).await?.items)
            }
            None if query.include_answers => {
                debug!("Listing questions with answers");
                self.repository.list_questions_with_answers().await
            }
            None => {
                debug!("Listing questions");
                self.repository.list_questions().await
            }
        }
    }

    async fn unanswered_questions(&self) -> QandaResult<Vec<Question>> {
        debug!("Listing unanswered questions");
        self.repository.unanswered_questions().await
    }

    async fn get_question(&self, id: QuestionId) -> QandaResult<Question> {
        if let Some(question) = self.cache.get(id) {
            debug!(question_id = %id, "Question served from cache");
            return Ok(question);
        }

        debug!(question_id = %id, "Loading question");
        let ticket = self.cache.fill_ticket(id);
        let question = self.load(id).await?;
        if !self.cache.set_if_current(ticket, question.clone()) {
            debug!(question_id = %id, "Question changed while loading; not cached");
        }
        Ok(question)
    }

    async fn create_question(&self, author: &Identity, request: CreateQuestionRequest) -> QandaResult<Question> {
        request.validate_request()?;
        debug!(user_id = %author.user_id, "Creating question");

        let saved = self
            .repository
            .create_question(NewQuestion::new(request.title, request.content, author))
            .await?;

        info!(question_id = %saved.id, user_id = %author.user_id, "Question created");
        Ok(saved)
    }

    async fn update_question(
        &self,
        caller: &Identity,
        id: QuestionId,
        request: UpdateQuestionRequest,
    ) -> QandaResult<Question> {
        request.validate_request()?;
        debug!(question_id = %id, user_id = %caller.user_id, "Updating question");

        let current = self.load_owned(caller, id).await?;
        let update = QuestionUpdate::merge(&current, request.title.as_deref(), request.content.as_deref());

        let repository = Arc::clone(&self.repository);
        let saved = self
            .write(id, true, async move { repository.update_question(id, update).await })
            .await?
            .ok_or_else(|| QandaError::not_found("Question", id))?;

        info!(question_id = %id, "Question updated");
        Ok(saved)
    }

    async fn delete_question(&self, caller: &Identity, id: QuestionId) -> QandaResult<()> {
        debug!(question_id = %id, user_id = %caller.user_id, "Deleting question");

        self.load_owned(caller, id).await?;

        let repository = Arc::clone(&self.repository);
        let deleted = self
            .write(id, false, async move { repository.delete_question(id).await })
            .await?;
        if !deleted {
            return Err(QandaError::not_found("Question", id));
        }

        info!(question_id = %id, "Question deleted");
        Ok(())
    }

    async fn post_answer(&self, author: &Identity, request: CreateAnswerRequest) -> QandaResult<Answer> {
        request.validate_request()?;
        let id = request.question_id;
        debug!(question_id = %id, user_id = %author.user_id, "Posting answer");

        if !self.repository.question_exists(id).await? {
            return Err(QandaError::not_found("Question", id));
        }

        let repository = Arc::clone(&self.repository);
        let answer = NewAnswer::new(id, request.content, author);
        let saved = self
            .write(id, true, async move { repository.create_answer(answer).await })
            .await?;

        info!(question_id = %id, answer_id = %saved.id, "Answer posted");
        Ok(saved)
    }

    async fn get_answer(&self, id: AnswerId) -> QandaResult<Answer> {
        debug!(answer_id = %id, "Loading answer");
        self.repository
            .get_answer(id)
            .await?
            .ok_or_else(|| QandaError::not_found("Answer", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LruQuestionCache;
    use crate::realtime::MockUpdateNotifier;
    use chrono::Utc;
    use mockall::{mock, predicate::eq};
    use qanda_core::{Page, PageRequest};
    use qanda_repository::InMemoryQuestionRepository;
    use std::num::NonZeroUsize;

    mock! {
        pub Repo {}

        #[async_trait]
        impl QuestionRepository for Repo {
            async fn get_question(&self, id: QuestionId) -> QandaResult<Option<Question>>;
            async fn question_exists(&self, id: QuestionId) -> QandaResult<bool>;
            async fn get_answer(&self, id: AnswerId) -> QandaResult<Option<Answer>>;
            async fn list_questions(&self) -> QandaResult<Vec<Question>>;
            async fn list_questions_with_answers(&self) -> QandaResult<Vec<Question>>;
            async fn search_questions(&self, search: &str, page: PageRequest) -> QandaResult<Page<Question>>;
            async fn unanswered_questions(&self) -> QandaResult<Vec<Question>>;
            async fn create_question(&self, question: NewQuestion) -> QandaResult<Question>;
            async fn update_question(&self, id: QuestionId, update: QuestionUpdate) -> QandaResult<Option<Question>>;
            async fn delete_question(&self, id: QuestionId) -> QandaResult<bool>;
            async fn create_answer(&self, answer: NewAnswer) -> QandaResult<Answer>;
        }
    }

    fn alice() -> Identity {
        Identity::new("auth0|alice", "alice")
    }

    fn bob() -> Identity {
        Identity::new("auth0|bob", "bob")
    }

    fn question(id: i64) -> Question {
        Question {
            id: QuestionId(id),
            title: "Title".to_string(),
            content: "Content".to_string(),
            user_id: alice().user_id,
            user_name: alice().user_name,
            created: Utc::now(),
            answers: Vec::new(),
        }
    }

    fn cache() -> Arc<LruQuestionCache> {
        Arc::new(LruQuestionCache::new(NonZeroUsize::new(10).unwrap()))
    }

    fn quiet() -> Arc<MockUpdateNotifier> {
        let mut notifier = MockUpdateNotifier::new();
        notifier.expect_notify_question_updated().never();
        Arc::new(notifier)
    }

    fn notified_once(id: QuestionId) -> Arc<MockUpdateNotifier> {
        let mut notifier = MockUpdateNotifier::new();
        notifier
            .expect_notify_question_updated()
            .with(eq(id))
            .times(1)
            .return_const(());
        Arc::new(notifier)
    }

    fn answer_request(id: i64, content: &str) -> CreateAnswerRequest {
        CreateAnswerRequest {
            question_id: QuestionId(id),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_question_fills_cache_once() {
        let mut repo = MockRepo::new();
        repo.expect_get_question()
            .with(eq(QuestionId(1)))
            .times(1)
            .returning(|id| Ok(Some(question(id.0))));

        let cache = cache();
        let service = QuestionServiceImpl::new(Arc::new(repo), cache.clone(), quiet());

        let first = service.get_question(QuestionId(1)).await.unwrap();
        let second = service.get_question(QuestionId(1)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_question_is_not_found_and_not_cached() {
        let mut repo = MockRepo::new();
        repo.expect_get_question().returning(|_| Ok(None));

        let cache = cache();
        let service = QuestionServiceImpl::new(Arc::new(repo), cache.clone(), quiet());

        let err = service.get_question(QuestionId(4)).await.unwrap_err();
        assert!(matches!(err, QandaError::NotFound { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_answer_invalidates_cached_question() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let cache = cache();
        for _ in 0..7 {
            repo.create_question(NewQuestion::new("Title", "Content", &alice()))
                .await
                .unwrap();
        }
        let id = QuestionId(7);
        let service = QuestionServiceImpl::new(repo.clone(), cache.clone(), notified_once(id));

        assert!(service.get_question(id).await.unwrap().answers.is_empty());
        assert!(cache.get(id).is_some());

        service.post_answer(&bob(), answer_request(7, "An answer")).await.unwrap();
        assert!(cache.get(id).is_none());

        let fresh = service.get_question(id).await.unwrap();
        assert_eq!(fresh.answers.len(), 1);
        assert_eq!(fresh.answers[0].user_name, "bob");
    }

    #[tokio::test]
    async fn test_answer_to_missing_question_is_not_found() {
        let mut repo = MockRepo::new();
        repo.expect_question_exists().returning(|_| Ok(false));
        repo.expect_create_answer().never();

        let service = QuestionServiceImpl::new(Arc::new(repo), cache(), quiet());
        let err = service.post_answer(&bob(), answer_request(9, "x")).await.unwrap_err();
        assert!(matches!(err, QandaError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_still_invalidates_without_notifying() {
        let mut repo = MockRepo::new();
        repo.expect_question_exists().returning(|_| Ok(true));
        repo.expect_create_answer()
            .returning(|_| Err(QandaError::Database("connection reset".to_string())));

        let cache = cache();
        cache.set(question(3));
        let service = QuestionServiceImpl::new(Arc::new(repo), cache.clone(), quiet());

        let err = service.post_answer(&bob(), answer_request(3, "x")).await.unwrap_err();
        assert!(matches!(err, QandaError::Database(_)));
        assert!(cache.get(QuestionId(3)).is_none());
    }

    #[tokio::test]
    async fn test_answer_racing_a_delete_is_not_found() {
        let mut repo = MockRepo::new();
        repo.expect_question_exists().returning(|_| Ok(true));
        repo.expect_create_answer()
            .returning(|a| Err(QandaError::not_found("Question", a.question_id)));

        let cache = cache();
        cache.set(question(4));
        let service = QuestionServiceImpl::new(Arc::new(repo), cache.clone(), quiet());

        let err = service.post_answer(&bob(), answer_request(4, "x")).await.unwrap_err();
        assert!(matches!(err, QandaError::NotFound { .. }));
        assert!(cache.get(QuestionId(4)).is_none());
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let mut repo = MockRepo::new();
        repo.expect_get_question().returning(|id| Ok(Some(question(id.0))));
        repo.expect_update_question().never();

        let service = QuestionServiceImpl::new(Arc::new(repo), cache(), quiet());
        let err = service
            .update_question(&bob(), QuestionId(2), UpdateQuestionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QandaError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_not_found_takes_precedence_over_forbidden() {
        let mut repo = MockRepo::new();
        repo.expect_get_question().returning(|_| Ok(None));

        let service = QuestionServiceImpl::new(Arc::new(repo), cache(), quiet());
        let update = service
            .update_question(&bob(), QuestionId(2), UpdateQuestionRequest::default())
            .await;
        assert!(matches!(update, Err(QandaError::NotFound { .. })));

        let delete = service.delete_question(&bob(), QuestionId(2)).await;
        assert!(matches!(delete, Err(QandaError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_keeps_empty_fields_and_invalidates() {
        let mut repo = MockRepo::new();
        repo.expect_get_question().returning(|id| Ok(Some(question(id.0))));
        repo.expect_update_question()
            .withf(|id, update| *id == QuestionId(5) && update.title == "New title" && update.content == "Content")
            .times(1)
            .returning(|id, update| {
                let mut saved = question(id.0);
                saved.title = update.title;
                saved.content = update.content;
                Ok(Some(saved))
            });

        let cache = cache();
        cache.set(question(5));
        let service = QuestionServiceImpl::new(Arc::new(repo), cache.clone(), notified_once(QuestionId(5)));

        let saved = service
            .update_question(
                &alice(),
                QuestionId(5),
                UpdateQuestionRequest {
                    title: Some("New title".to_string()),
                    content: Some(String::new()),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.title, "New title");
        assert_eq!(saved.content, "Content");
        assert!(cache.get(QuestionId(5)).is_none());
    }

    #[tokio::test]
    async fn test_blank_update_fields_keep_stored_values() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let created = repo
            .create_question(NewQuestion::new("Title", "Content", &alice()))
            .await
            .unwrap();
        let service = QuestionServiceImpl::new(repo, cache(), notified_once(created.id));

        let saved = service
            .update_question(
                &alice(),
                created.id,
                UpdateQuestionRequest {
                    title: Some("   ".to_string()),
                    content: Some("Edited".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.title, "Title");
        assert_eq!(saved.content, "Edited");
    }

    #[tokio::test]
    async fn test_delete_removes_question_and_cache_entry() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let created = repo
            .create_question(NewQuestion::new("Title", "Content", &alice()))
            .await
            .unwrap();
        let cache = cache();
        let service = QuestionServiceImpl::new(repo, cache.clone(), quiet());

        service.get_question(created.id).await.unwrap();
        assert!(cache.get(created.id).is_some());

        let forbidden = service.delete_question(&bob(), created.id).await;
        assert!(matches!(forbidden, Err(QandaError::Forbidden(_))));

        service.delete_question(&alice(), created.id).await.unwrap();
        assert!(cache.get(created.id).is_none());
        assert!(matches!(
            service.get_question(created.id).await,
            Err(QandaError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_question_validates_and_stamps_author() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let service = QuestionServiceImpl::new(repo, cache(), quiet());

        let invalid = service
            .create_question(
                &alice(),
                CreateQuestionRequest {
                    title: String::new(),
                    content: "Body".to_string(),
                },
            )
            .await;
        assert!(matches!(invalid, Err(QandaError::ValidationErrors { .. })));

        let saved = service
            .create_question(
                &alice(),
                CreateQuestionRequest {
                    title: "A question".to_string(),
                    content: "Body".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.user_id, "auth0|alice");
        assert_eq!(saved.user_name, "alice");
    }

    #[tokio::test]
    async fn test_list_dispatches_on_query() {
        let mut repo = MockRepo::new();
        repo.expect_list_questions().times(1).returning(|| Ok(vec![question(1)]));
        repo.expect_list_questions_with_answers()
            .times(1)
            .returning(|| Ok(vec![question(1), question(2)]));
        repo.expect_search_questions()
            .withf(|search, page| search == "rust" && page.page == 2 && page.page_size == 5)
            .times(1)
            .returning(|_, page| Ok(Page::new(vec![question(3)], page, 6)));

        let service = QuestionServiceImpl::new(Arc::new(repo), cache(), quiet());

        assert_eq!(service.list_questions(ListQuery::default()).await.unwrap().len(), 1);

        let with_answers = ListQuery {
            include_answers: true,
            ..ListQuery::default()
        };
        assert_eq!(service.list_questions(with_answers).await.unwrap().len(), 2);

        let search = ListQuery {
            search: Some(" rust ".to_string()),
            page: Some(2),
            page_size: Some(5),
            ..ListQuery::default()
        };
        let found = service.list_questions(search).await.unwrap();
        assert_eq!(found.iter().map(|q| q.id).collect::<Vec<_>>(), vec![QuestionId(3)]);
    }

    #[tokio::test]
    async fn test_get_missing_answer_is_not_found() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let service = QuestionServiceImpl::new(repo, cache(), quiet());
        assert!(matches!(
            service.get_answer(AnswerId(1)).await,
            Err(QandaError::NotFound { .. })
        ));
    }
}
