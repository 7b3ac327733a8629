//! JWT token provider for validating bearer tokens.

use super::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use qanda_config::SecurityConfig;
use qanda_core::{Identity, QandaError, QandaResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies bearer tokens and yields the caller identity.
pub trait IdentityVerifier: Send + Sync {
    /// Validates a token and returns its claims.
    fn verify(&self, token: &str) -> QandaResult<Claims>;

    /// Validates a token and returns the caller identity.
    fn identity(&self, token: &str) -> QandaResult<Identity> {
        self.verify(token).map(|claims| claims.identity())
    }
}

/// JWT token provider (HS256).
#[derive(Clone)]
pub struct TokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: Arc<SecurityConfig>,
    validation: Validation,
}

impl TokenProvider {
    /// Creates a new token provider.
    #[must_use]
    pub fn new(config: Arc<SecurityConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;

        Self {
            encoding_key,
            decoding_key,
            config,
            validation,
        }
    }

    /// Issues a token for a subject, valid for `ttl`.
    ///
    /// Production tokens come from the identity provider; this serves tests
    /// and local tooling.
    pub fn generate(&self, identity: &Identity, ttl: Duration) -> QandaResult<String> {
        let claims = Claims::new(
            identity.user_id.clone(),
            identity.user_name.clone(),
            self.config.jwt_issuer.clone(),
            self.config.jwt_audience.clone(),
            Utc::now() + ttl,
        );

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| QandaError::Internal(format!("Failed to generate token: {e}")))?;

        debug!(sub = %identity.user_id, "Generated token");
        Ok(token)
    }

    /// Validates a token and returns the claims.
    pub fn validate_token(&self, token: &str) -> QandaResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => QandaError::TokenExpired,
                ErrorKind::InvalidToken | ErrorKind::InvalidSignature => {
                    QandaError::InvalidToken("Invalid token signature".to_string())
                }
                ErrorKind::InvalidIssuer => QandaError::InvalidToken("Invalid token issuer".to_string()),
                ErrorKind::InvalidAudience => {
                    QandaError::InvalidToken("Invalid token audience".to_string())
                }
                _ => QandaError::InvalidToken(e.to_string()),
            }
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(QandaError::InvalidToken("Token has no subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

impl IdentityVerifier for TokenProvider {
    fn verify(&self, token: &str) -> QandaResult<Claims> {
        self.validate_token(token)
    }
}
