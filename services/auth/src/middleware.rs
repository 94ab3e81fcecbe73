//! Middleware extracting the refresh token carried in request metadata

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::error::AuthError;

/// Header carrying the refresh token
pub const REFRESH_TOKEN_HEADER: &str = "refresh_token";

/// Hyphenated spelling, for proxies that drop header names with underscores
pub const REFRESH_TOKEN_HEADER_ALT: &str = "refresh-token";

/// Refresh token taken from the request headers
#[derive(Debug, Clone)]
pub struct RefreshToken(pub String);

/// Require a refresh token header and expose it to handlers
pub async fn refresh_token_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let headers = req.headers();
    let token = headers
        .get(REFRESH_TOKEN_HEADER)
        .or_else(|| headers.get(REFRESH_TOKEN_HEADER_ALT))
        .ok_or_else(|| AuthError::Unauthorized("refresh_token is not provided".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthorized("refresh_token is malformed".to_string()))?
        .trim()
        .to_string();

    if token.is_empty() {
        return Err(AuthError::Unauthorized(
            "refresh_token is not provided".to_string(),
        ));
    }

    req.extensions_mut().insert(RefreshToken(token));

    Ok(next.run(req).await)
}
