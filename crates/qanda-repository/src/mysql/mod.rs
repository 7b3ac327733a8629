//! MySQL repository implementations.

mod question_repository;

pub use question_repository::MySqlQuestionRepository;
