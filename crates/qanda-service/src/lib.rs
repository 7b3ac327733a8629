//! # Qanda Service
//!
//! The stateful core of the server and the question use cases built on it.
//!
//! - [`cache`]: bounded single-question cache kept coherent by explicit
//!   invalidation.
//! - [`realtime`]: subscription registry, connection hub, and the broadcast
//!   dispatcher that pushes updated questions to subscribed connections.
//! - [`QuestionService`]: request-level operations that tie the two to the
//!   persistence collaborator.

pub mod cache;
pub mod dto;
pub mod metrics;
pub mod question_service;
pub mod realtime;
pub mod r#impl;

pub use cache::*;
pub use dto::*;
pub use question_service::*;
pub use r#impl::QuestionServiceImpl;
pub use realtime::*;
