use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use lifelink_db::models::NotificationRow;
use lifelink_db::time;
use lifelink_types::api::{CreateNotificationRequest, NotificationResponse};
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        content: row.content,
        retrieved: row.retrieved,
        created_at: time::from_db(&row.created_at),
    }
}

pub async fn create_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = blocking(move || {
        if !state.db.user_exists(id)? {
            return Err(ApiError::user_not_found(id));
        }
        let row = state.db.create_notification(id, &req.title, &req.content)?;
        Ok(notification_response(row))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(notification, "Notification created successfully")),
    ))
}

/// Listing marks everything unretrieved as retrieved; the returned rows show
/// the pre-listing state so a client can tell which ones are new.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = blocking(move || {
        if !state.db.user_exists(id)? {
            return Err(ApiError::user_not_found(id));
        }
        let rows = state.db.notifications_for_user(id)?;
        Ok(rows.into_iter().map(notification_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(notifications, "Notifications retrieved successfully")))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path((id, notification_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.user_exists(id)? {
            return Err(ApiError::user_not_found(id));
        }
        if !state.db.delete_notification(notification_id)? {
            return Err(ApiError::NotFound(format!(
                "Notification not found with ID {}",
                notification_id
            )));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Notification deleted successfully")))
}
