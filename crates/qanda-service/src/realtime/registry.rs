//! Question subscription groups.

use parking_lot::Mutex;
use qanda_core::{ConnectionId, QuestionId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::trace;

/// Name of the push group for one question, rendered as `Question-{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey(QuestionId);

impl GroupKey {
    /// Group for updates to `id`.
    #[must_use]
    pub const fn question(id: QuestionId) -> Self {
        Self(id)
    }

    /// Question the group follows.
    #[must_use]
    pub const fn question_id(&self) -> QuestionId {
        self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Question-{}", self.0)
    }
}

impl From<QuestionId> for GroupKey {
    fn from(id: QuestionId) -> Self {
        Self(id)
    }
}

#[derive(Default)]
struct Groups {
    members: HashMap<QuestionId, HashSet<ConnectionId>>,
    joined: HashMap<ConnectionId, HashSet<QuestionId>>,
}

/// Which connections follow which questions.
///
/// Both directions are kept under a single lock so a connection's groups can be
/// dropped in one step on disconnect. Empty groups are removed immediately.
#[derive(Default)]
pub struct SubscriptionRegistry {
    groups: Mutex<Groups>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection` to the group for `question`. Joining twice is a no-op.
    ///
    /// Returns `true` if the connection was not already a member.
    pub fn join(&self, question: QuestionId, connection: ConnectionId) -> bool {
        let mut groups = self.groups.lock();
        let added = groups.members.entry(question).or_default().insert(connection);
        groups.joined.entry(connection).or_default().insert(question);
        if added {
            trace!(question_id = %question, connection_id = %connection, "Joined group");
        }
        added
    }

    /// Removes `connection` from the group for `question`. Leaving a group the
    /// connection is not in is a no-op.
    ///
    /// Returns `true` if the connection was a member.
    pub fn leave(&self, question: QuestionId, connection: ConnectionId) -> bool {
        let mut groups = self.groups.lock();
        let removed = match groups.members.get_mut(&question) {
            Some(set) => {
                let removed = set.remove(&connection);
                if set.is_empty() {
                    groups.members.remove(&question);
                }
                removed
            }
            None => false,
        };
        if let Some(set) = groups.joined.get_mut(&connection) {
            set.remove(&question);
            if set.is_empty() {
                groups.joined.remove(&connection);
            }
        }
        if removed {
            trace!(question_id = %question, connection_id = %connection, "Left group");
        }
        removed
    }

    /// Connections currently following `question`.
    #[must_use]
    pub fn members(&self, question: QuestionId) -> HashSet<ConnectionId> {
        self.groups
            .lock()
            .members
            .get(&question)
            .cloned()
            .unwrap_or_default()
    }

    /// Questions `connection` currently follows.
    #[must_use]
    pub fn groups_of(&self, connection: ConnectionId) -> HashSet<QuestionId> {
        self.groups
            .lock()
            .joined
            .get(&connection)
            .cloned()
            .unwrap_or_default()
    }

    /// Drops `connection` from every group it joined.
    ///
    /// Returns the number of groups it left.
    pub fn remove_connection(&self, connection: ConnectionId) -> usize {
        let mut groups = self.groups.lock();
        let Some(questions) = groups.joined.remove(&connection) else {
            return 0;
        };
        for question in &questions {
            if let Some(set) = groups.members.get_mut(question) {
                set.remove(&connection);
                if set.is_empty() {
                    groups.members.remove(question);
                }
            }
        }
        questions.len()
    }

    /// Number of non-empty groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.lock().members.len()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("groups", &self.group_count())
            .finish()
    }
}
