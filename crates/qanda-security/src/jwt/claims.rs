//! JWT claims structure.

use chrono::{DateTime, Utc};
use qanda_core::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (opaque user identifier issued by the identity provider).
    pub sub: String,

    /// Display name. Empty when the provider did not include one.
    #[serde(default)]
    pub name: String,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,

    /// JWT ID.
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a subject.
    #[must_use]
    pub fn new(
        sub: impl Into<String>,
        name: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: sub.into(),
            name: name.into(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: issuer.into(),
            aud: audience.into(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the caller identity carried by these claims.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.name.clone())
    }

    /// Checks if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_identity_from_claims() {
        let claims = Claims::new("auth0|42", "Ada", "qanda", "qanda-api", Utc::now() + Duration::hours(1));
        let identity = claims.identity();
        assert_eq!(identity.user_id, "auth0|42");
        assert_eq!(identity.user_name, "Ada");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub":"auth0|1","iat":0,"exp":1,"iss":"qanda","aud":"qanda-api"}"#,
        )
        .unwrap();
        assert_eq!(claims.name, "");
        assert!(claims.is_expired());
    }
}
