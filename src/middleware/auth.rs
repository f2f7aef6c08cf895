use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{validate_jwt, AuthUser};
use crate::server::AppState;

/// Resolves the bearer token into an `AuthUser` request extension.
///
/// Never rejects on its own: a missing or bad token just leaves the request
/// without an identity, and the action guard turns that into UNAUTHORIZED.
pub async fn identity_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(user) = resolve_identity(request.headers(), &state.jwt_secret) {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

fn resolve_identity(headers: &HeaderMap, secret: &str) -> Option<AuthUser> {
    let token = match extract_jwt_from_headers(headers) {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(msg) => {
            warn!("Ignoring authorization header: {}", msg);
            return None;
        }
    };

    match validate_jwt(token, secret) {
        Ok(claims) => Some(AuthUser::from(claims)),
        Err(e) => {
            warn!("Rejected bearer token: {}", e);
            None
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token"),
        Some(token) => Ok(Some(token.trim())),
        None => Err("Authorization header must use Bearer token format"),
    }
}
