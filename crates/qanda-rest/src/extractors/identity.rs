//! Caller identity extractors.

use crate::responses::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use qanda_core::{Identity, QandaError};

/// Extractor for the authenticated caller.
///
/// Rejects with 401 unless the auth middleware accepted a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(identity.clone()));
        }

        let error = match parts.headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
            None => QandaError::unauthorized("Missing authorization header"),
            Some(header) if !header.starts_with("Bearer ") => {
                QandaError::unauthorized("Invalid authorization format")
            }
            Some(_) => QandaError::unauthorized("Invalid or expired token"),
        };
        Err(AppError(error))
    }
}

/// Optional caller identity. `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Identity>);

impl std::ops::Deref for OptionalUser {
    type Target = Option<Identity>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}
