use super::{FillTicket, QuestionCache};
use crate::metrics::CacheMetrics;
use lru::LruCache;
use parking_lot::Mutex;
use qanda_core::{Question, QuestionId};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::trace;

/// Removal history kept for fill checks before it is collapsed into the floor.
const REMOVAL_HISTORY: usize = 1024;

struct Inner {
    entries: LruCache<QuestionId, Question>,
    /// Bumped on every removal. Tickets carry the value current at issue.
    generation: u64,
    /// Generation of the latest removal per question.
    removed_at: HashMap<QuestionId, u64>,
    /// Tickets older than this are refused for every question.
    floor: u64,
}

impl Inner {
    fn is_current(&self, ticket: FillTicket) -> bool {
        ticket.generation >= self.floor
            && self
                .removed_at
                .get(&ticket.id)
                .map_or(true, |&removed| removed <= ticket.generation)
    }
}

/// Least-recently-used question cache with a fixed entry bound.
///
/// One mutex guards both the entries and the removal history, so a fill check
/// and its insert cannot interleave with a removal. A removal only refuses
/// fills for its own question.
pub struct LruQuestionCache {
    inner: Mutex<Inner>,
    capacity: NonZeroUsize,
}

impl LruQuestionCache {
    /// Creates a cache holding at most `capacity` questions.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                generation: 0,
                removed_at: HashMap::new(),
                floor: 0,
            }),
            capacity,
        }
    }

    fn insert(inner: &mut Inner, question: Question) {
        let id = question.id;
        if let Some((evicted, _)) = inner.entries.push(id, question) {
            if evicted != id {
                trace!(question_id = %evicted, "Evicted cached question");
                CacheMetrics::eviction();
            }
        }
    }
}

impl QuestionCache for LruQuestionCache {
    fn get(&self, id: QuestionId) -> Option<Question> {
        let found = self.inner.lock().entries.get(&id).cloned();
        if found.is_some() {
            CacheMetrics::hit();
        } else {
            CacheMetrics::miss();
        }
        found
    }

    fn set(&self, question: Question) {
        Self::insert(&mut self.inner.lock(), question);
    }

    fn remove(&self, id: QuestionId) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let generation = inner.generation;
        inner.removed_at.insert(id, generation);
        if inner.removed_at.len() > REMOVAL_HISTORY {
            inner.removed_at.clear();
            inner.floor = generation;
        }
        if inner.entries.pop(&id).is_some() {
            CacheMetrics::invalidation();
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn fill_ticket(&self, id: QuestionId) -> FillTicket {
        FillTicket {
            id,
            generation: self.inner.lock().generation,
        }
    }

    fn set_if_current(&self, ticket: FillTicket, question: Question) -> bool {
        debug_assert_eq!(ticket.id, question.id, "fill ticket used for another question");
        let mut inner = self.inner.lock();
        if !inner.is_current(ticket) || ticket.id != question.id {
            drop(inner);
            CacheMetrics::stale_fill();
            return false;
        }
        Self::insert(&mut inner, question);
        true
    }
}

impl std::fmt::Debug for LruQuestionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruQuestionCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
