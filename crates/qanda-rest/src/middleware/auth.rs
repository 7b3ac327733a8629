//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use qanda_security::IdentityVerifier;
use std::sync::Arc;
use tracing::debug;

/// Authentication middleware state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AuthMiddlewareState {
    /// Creates the middleware state.
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

/// Validates a bearer token, if present, and stores the caller
/// [`Identity`](qanda_core::Identity) in the request extensions.
///
/// Requests without a valid token pass through unauthenticated; handlers
/// that need a caller use the `AuthenticatedUser` extractor.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    if let Some(token) = token {
        match state.verifier.identity(token) {
            Ok(identity) => {
                debug!(user_id = %identity.user_id, "Authenticated request");
                request.extensions_mut().insert(identity);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(request).await
}
