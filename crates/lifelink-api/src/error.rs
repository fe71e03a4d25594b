use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use lifelink_types::response::Envelope;

/// Two failure classes: explicit precondition failures (not-found, conflict,
/// validation) carry a templated message; anything unexpected becomes a 500
/// with a generic message, the cause only reaching the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound(format!("User not found with ID {}", id))
    }

    pub fn challenge_not_found(id: i64) -> Self {
        Self::NotFound(format!("Challenge not found with ID {}", id))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(e) => {
                error!("internal error: {:#}", e);
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(Envelope::error(status.as_u16(), message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_variants() {
        assert_eq!(ApiError::user_not_found(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("taken".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_is_templated() {
        assert_eq!(ApiError::user_not_found(42).to_string(), "User not found with ID 42");
        assert_eq!(
            ApiError::challenge_not_found(3).to_string(),
            "Challenge not found with ID 3"
        );
    }
}
