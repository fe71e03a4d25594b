use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{ACCESS_SUBJECT, decode_token};
use crate::error::ApiError;
use crate::AppState;

/// Extract and validate the bearer access token, then stash the claims in
/// request extensions for handlers that want the caller's identity.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = decode_token(&state.jwt_secret, token, ACCESS_SUBJECT)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
