use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use lifelink_db::models::FriendRow;
use lifelink_db::time;
use lifelink_types::api::{FriendResponse, UpdateFriendRequest};
use lifelink_types::enums::FriendshipStatus;
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

fn friend_response(row: FriendRow) -> FriendResponse {
    FriendResponse {
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        status: row.status.parse().unwrap_or_else(|e| {
            warn!(
                "Corrupt friendship status on edge {} -> {}: {}",
                row.sender_id, row.receiver_id, e
            );
            FriendshipStatus::Pending
        }),
        created_at: time::from_db(&row.created_at),
    }
}

fn check_user(state: &AppState, id: i64) -> Result<(), ApiError> {
    if !state.db.user_exists(id)? {
        return Err(ApiError::user_not_found(id));
    }
    Ok(())
}

pub async fn send_request(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    if id == friend_id {
        return Err(ApiError::Validation("Cannot send a friend request to yourself".into()));
    }

    let edge = blocking(move || {
        check_user(&state, id)?;
        check_user(&state, friend_id)?;
        state
            .db
            .send_friend_request(id, friend_id)?
            .map(friend_response)
            .ok_or_else(|| {
                ApiError::Conflict(format!(
                    "A friendship between users {} and {} already exists",
                    id, friend_id
                ))
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(edge, "Friend request sent successfully")),
    ))
}

/// The path user responds to a request sent by `friend_id`, so the edge
/// looked up runs friend_id -> id. Only the receiver accepts or blocks.
pub async fn respond_to_request(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let edge = blocking(move || {
        check_user(&state, id)?;
        state
            .db
            .set_friend_status(friend_id, id, req.status.as_str())?
            .map(friend_response)
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Friend request not found from user {} to user {}",
                    friend_id, id
                ))
            })
    })
    .await?;

    Ok(Json(Envelope::ok(edge, "Friend request updated successfully")))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let friends = blocking(move || {
        check_user(&state, id)?;
        let rows = state.db.list_friends(id)?;
        Ok(rows.into_iter().map(friend_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(friends, "Friends retrieved successfully")))
}

pub async fn incoming_requests(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = blocking(move || {
        check_user(&state, id)?;
        let rows = state.db.list_incoming_requests(id)?;
        Ok(rows.into_iter().map(friend_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(requests, "Friend requests retrieved successfully")))
}

pub async fn sent_requests(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = blocking(move || {
        check_user(&state, id)?;
        let rows = state.db.list_sent_requests(id)?;
        Ok(rows.into_iter().map(friend_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(requests, "Sent requests retrieved successfully")))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        check_user(&state, id)?;
        if !state.db.delete_friend(id, friend_id)? {
            return Err(ApiError::NotFound(format!(
                "No friendship found between users {} and {}",
                id, friend_id
            )));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Friend deleted successfully")))
}
