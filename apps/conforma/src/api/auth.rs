//! # Authentication Module
//!
//! Bearer-token authentication for every route under `/api`.
//!
//! ```text
//! Authorization: Bearer cfm_<user_id>_<secret>
//! ```
//!
//! The middleware resolves the token to an [`Actor`] and stores it as a
//! request extension; handlers take it with `Extension<Actor>`.

use super::{AppState, types::ApiError};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use conforma_core::{Actor, ConformaError};

/// Token carried by an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticate the request and attach the [`Actor`].
pub async fn require_actor(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err(ConformaError::Unauthorized.into());
    };

    let authenticated = state.store.lock().await.authenticate(&token);
    let actor: Actor = authenticated.inspect_err(|_| {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_token",
            "Authentication failed: invalid token"
        );
    })?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("cfm_1_abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer cfm_1_abc"));
        assert_eq!(bearer_token(&headers), Some("cfm_1_abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
