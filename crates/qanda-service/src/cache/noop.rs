use super::{FillTicket, QuestionCache};
use qanda_core::{Question, QuestionId};

/// Cache used when caching is disabled. Every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQuestionCache;

impl QuestionCache for NoopQuestionCache {
    fn get(&self, _id: QuestionId) -> Option<Question> {
        None
    }

    fn set(&self, _question: Question) {}

    fn remove(&self, _id: QuestionId) {}

    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }

    fn fill_ticket(&self, id: QuestionId) -> FillTicket {
        FillTicket { id, generation: 0 }
    }

    fn set_if_current(&self, _ticket: FillTicket, _question: Question) -> bool {
        false
    }
}
