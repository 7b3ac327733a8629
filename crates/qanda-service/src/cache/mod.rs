//! Bounded single-question cache.
//!
//! The cache is an optimization only. Every write path removes the entry for
//! the question it touched, and read-miss fills go through a [`FillTicket`]
//! so a slow reader cannot re-insert a value that a write already invalidated.

mod lru_cache;
mod noop;

pub use lru_cache::LruQuestionCache;
pub use noop::NoopQuestionCache;

use qanda_config::CacheConfig;
use qanda_core::{Question, QuestionId};
use std::sync::Arc;

/// Permission to fill the cache after a read miss.
///
/// Issued before the persistence load; redeemed with
/// [`QuestionCache::set_if_current`] once the load returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket {
    pub(crate) id: QuestionId,
    pub(crate) generation: u64,
}

impl FillTicket {
    /// Question the ticket was issued for.
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.id
    }
}

/// Shared question cache.
///
/// All operations are synchronous and safe to call from many tasks at once.
pub trait QuestionCache: Send + Sync {
    /// Returns the cached question, if present.
    fn get(&self, id: QuestionId) -> Option<Question>;

    /// Stores or overwrites the entry keyed by the question id.
    fn set(&self, question: Question);

    /// Removes the entry. Absent entries are a no-op.
    fn remove(&self, id: QuestionId);

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// Returns `true` when nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    /// Issues a ticket for filling `id` after a miss.
    fn fill_ticket(&self, id: QuestionId) -> FillTicket;

    /// Stores `question` unless the entry was removed after `ticket` was issued.
    ///
    /// Returns whether the value was stored.
    fn set_if_current(&self, ticket: FillTicket, question: Question) -> bool;
}

/// Builds the cache described by the configuration.
#[must_use]
pub fn build_cache(config: &CacheConfig) -> Arc<dyn QuestionCache> {
    match config.capacity() {
        Some(capacity) if config.enabled => Arc::new(LruQuestionCache::new(capacity)),
        _ => Arc::new(NoopQuestionCache),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cache_respects_enabled_flag() {
        let enabled = build_cache(&CacheConfig {
            enabled: true,
            capacity: 5,
        });
        assert_eq!(enabled.capacity(), 5);

        let disabled = build_cache(&CacheConfig {
            enabled: false,
            capacity: 5,
        });
        assert_eq!(disabled.capacity(), 0);
    }
}
