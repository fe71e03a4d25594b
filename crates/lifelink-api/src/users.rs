use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;

use lifelink_db::models::UserRow;
use lifelink_db::time;
use lifelink_types::api::{UpdateUserRequest, UserResponse};
use lifelink_types::enums::UserRole;
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

pub(crate) fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        username: row.username,
        email: row.email,
        birthdate: time::date_from_db(&row.birthdate),
        city: row.city,
        blood_type: row.blood_type,
        nationality: row.nationality,
        gender: row.gender,
        is_eligible: row.is_eligible,
        current_points: row.current_points,
        total_points: row.total_points,
        role: row.role.parse().unwrap_or_else(|e| {
            warn!("Corrupt role on user {}: {}", row.id, e);
            UserRole::User
        }),
        created_at: time::from_db(&row.created_at),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(move || {
        state
            .db
            .get_user(id)?
            .map(user_response)
            .ok_or_else(|| ApiError::user_not_found(id))
    })
    .await?;

    Ok(Json(Envelope::ok(user, "User retrieved successfully")))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(move || {
        state
            .db
            .get_user_by_username(&username)?
            .map(user_response)
            .ok_or_else(|| ApiError::NotFound(format!("User not found with username {}", username)))
    })
    .await?;

    Ok(Json(Envelope::ok(user, "User retrieved successfully")))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(move || {
        state
            .db
            .update_user(id, &req)?
            .map(user_response)
            .ok_or_else(|| ApiError::user_not_found(id))
    })
    .await?;

    Ok(Json(Envelope::ok(user, "User updated successfully")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.delete_user(id)? {
            return Err(ApiError::user_not_found(id));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("User deleted successfully")))
}
