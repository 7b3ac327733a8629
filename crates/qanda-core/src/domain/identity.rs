use serde::{Deserialize, Serialize};

/// The authenticated caller of a write operation.
///
/// `user_id` is the opaque subject issued by the identity provider and
/// `user_name` is its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
}

impl Identity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }

    /// Returns true if this identity authored content owned by `owner_id`.
    #[must_use]
    pub fn owns(&self, owner_id: &str) -> bool {
        self.user_id == owner_id
    }
}
