//! Integration tests for `MySqlQuestionRepository`.
//!
//! These tests run against a real MySQL database using testcontainers and
//! need a Docker daemon: `cargo test -p qanda-repository -- --ignored`.

mod common;

use chrono::{Duration, Utc};
use qanda_core::{Identity, NewAnswer, NewQuestion, PageRequest, QandaError, QuestionId, QuestionUpdate};
use qanda_repository::{MySqlQuestionRepository, QuestionRepository};
use common::TestDatabase;

fn alice() -> Identity {
    Identity::new("auth0|alice", "alice@example.com")
}

fn question(title: &str, content: &str, age_minutes: i64) -> NewQuestion {
    let mut new = NewQuestion::new(title, content, &alice());
    new.created = Utc::now() - Duration::minutes(age_minutes);
    new
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_and_get_question_with_answers() {
    let db = TestDatabase::new().await;
    let repo = MySqlQuestionRepository::new(db.pool());

    let saved = repo
        .create_question(question("Which ORM?", "sqlx or diesel", 0))
        .await
        .expect("Failed to save question");
    assert_eq!(saved.title, "Which ORM?");
    assert!(saved.answers.is_empty());

    let first = repo
        .create_answer(NewAnswer::new(saved.id, "sqlx", &alice()))
        .await
        .expect("Failed to save answer");
    let second = repo
        .create_answer(NewAnswer::new(saved.id, "diesel", &alice()))
        .await
        .expect("Failed to save answer");

    let found = repo
        .get_question(saved.id)
        .await
        .expect("Query failed")
        .expect("Question not found");
    assert_eq!(found.answers.iter().map(|a| a.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    assert_eq!(found.user_id, "auth0|alice");
    assert!(repo.question_exists(saved.id).await.unwrap());
    assert_eq!(repo.get_answer(first.id).await.unwrap().map(|a| a.content), Some("sqlx".to_string()));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_get_missing_question_is_none() {
    let db = TestDatabase::new().await;
    let repo = MySqlQuestionRepository::new(db.pool());

    assert!(repo.get_question(QuestionId(404)).await.unwrap().is_none());
    assert!(!repo.question_exists(QuestionId(404)).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_answer_to_deleted_question_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = MySqlQuestionRepository::new(db.pool());

    let saved = repo
        .create_question(question("Short lived", "gone soon", 0))
        .await
        .expect("Failed to save question");
    assert!(repo.delete_question(saved.id).await.unwrap());

    let err = repo
        .create_answer(NewAnswer::new(saved.id, "too late", &alice()))
        .await
        .unwrap_err();
    assert!(matches!(err, QandaError::NotFound { .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_lists_search_and_unanswered() {
    let db = TestDatabase::new().await;
    let repo = MySqlQuestionRepository::new(db.pool());

    let old = repo.create_question(question("Rust lifetimes", "explain", 30)).await.unwrap();
    let mid = repo.create_question(question("Async in rust", "tokio?", 20)).await.unwrap();
    let new = repo.create_question(question("Go channels", "how", 10)).await.unwrap();
    repo.create_answer(NewAnswer::new(old.id, "read the book", &alice())).await.unwrap();

    let listed = repo.list_questions().await.unwrap();
    assert_eq!(listed.iter().map(|q| q.id).collect::<Vec<_>>(), vec![new.id, mid.id, old.id]);

    let with_answers = repo.list_questions_with_answers().await.unwrap();
    assert_eq!(with_answers[2].answers.len(), 1);

    let unanswered = repo.unanswered_questions().await.unwrap();
    assert_eq!(unanswered.iter().map(|q| q.id).collect::<Vec<_>>(), vec![new.id, mid.id]);

    let page = repo.search_questions("RUST", PageRequest::new(1, 1)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, mid.id);
    assert!(page.has_next());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_and_cascading_delete() {
    let db = TestDatabase::new().await;
    let repo = MySqlQuestionRepository::new(db.pool());

    let saved = repo.create_question(question("Title", "Body", 0)).await.unwrap();
    let answer = repo.create_answer(NewAnswer::new(saved.id, "answer", &alice())).await.unwrap();

    let updated = repo
        .update_question(
            saved.id,
            QuestionUpdate {
                title: "New title".to_string(),
                content: "Body".to_string(),
            },
        )
        .await
        .unwrap()
        .expect("Question vanished");
    assert_eq!(updated.title, "New title");

    assert!(repo.delete_question(saved.id).await.unwrap());
    assert!(!repo.delete_question(saved.id).await.unwrap());
    assert!(repo.get_answer(answer.id).await.unwrap().is_none());
}
