//! # Qanda Repository
//!
//! Persistence for questions and answers.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn QuestionRepository>
//! MySqlQuestionRepository  |  InMemoryQuestionRepository
//!   ↓
//! MySQL
//! ```
//!
//! The in-memory store backs tests and runs the server when no database URL
//! is configured.

pub mod memory;
pub mod mysql;
pub mod pool;
pub mod traits;

pub use memory::InMemoryQuestionRepository;
pub use mysql::*;
pub use pool::*;
pub use traits::*;
