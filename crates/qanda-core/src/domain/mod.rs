//! Domain entities.

mod identity;
mod question;

pub use identity::Identity;
pub use question::{Answer, NewAnswer, NewQuestion, Question, QuestionUpdate};
