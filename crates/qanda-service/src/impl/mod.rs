//! Service implementations.

mod question_service_impl;

pub use question_service_impl::QuestionServiceImpl;
