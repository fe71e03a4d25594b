use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use lifelink_db::models::{KudosRow, PostRow};
use lifelink_db::time;
use lifelink_types::api::{CreateKudosRequest, CreatePostRequest, KudosResponse, PostResponse};
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    10
}

fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        content: row.content,
        post_type: row.post_type,
        created_at: time::from_db(&row.created_at),
    }
}

fn kudos_response(row: KudosRow) -> KudosResponse {
    KudosResponse {
        id: row.id,
        post_id: row.post_id,
        user_id: row.user_id,
        created_at: time::from_db(&row.created_at),
    }
}

fn post_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Post not found with ID {}", id))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = blocking(move || {
        if !state.db.user_exists(req.user_id)? {
            return Err(ApiError::user_not_found(req.user_id));
        }
        let row = state.db.create_post(req.user_id, &req.title, &req.content, &req.post_type)?;
        Ok(post_response(row))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(post, "Post created successfully")),
    ))
}

pub async fn posts_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(move || {
        if !state.db.user_exists(user_id)? {
            return Err(ApiError::user_not_found(user_id));
        }
        let rows = state.db.posts_by_user(user_id)?;
        Ok(rows.into_iter().map(post_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(posts, "Posts retrieved successfully")))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.delete_post(id)? {
            return Err(post_not_found(id));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Post deleted successfully")))
}

pub async fn add_kudos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateKudosRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kudos = blocking(move || {
        if !state.db.user_exists(req.user_id)? {
            return Err(ApiError::user_not_found(req.user_id));
        }
        if state.db.get_post(id)?.is_none() {
            return Err(post_not_found(id));
        }
        state.db.add_kudos(id, req.user_id)?.map(kudos_response).ok_or_else(|| {
            ApiError::Conflict(format!("User {} already gave kudos to post {}", req.user_id, id))
        })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(kudos, "Kudos added successfully")),
    ))
}

pub async fn kudos_by_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let kudos = blocking(move || {
        if state.db.get_post(id)?.is_none() {
            return Err(post_not_found(id));
        }
        let rows = state.db.kudos_by_post(id)?;
        Ok(rows.into_iter().map(kudos_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(kudos, "Kudos retrieved successfully")))
}

pub async fn delete_kudos(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.user_exists(user_id)? {
            return Err(ApiError::user_not_found(user_id));
        }
        if !state.db.delete_kudos(id, user_id)? {
            return Err(ApiError::NotFound(format!(
                "Kudos not found for post with ID {} and user with ID {}",
                id, user_id
            )));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Kudos deleted successfully")))
}

/// Friend feed: posts owned by the requester's accepted friends, most recent
/// first. No temporal or flag filter, unlike the donation feed.
pub async fn friends_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(100);
    let posts = blocking(move || {
        if !state.db.user_exists(user_id)? {
            return Err(ApiError::user_not_found(user_id));
        }
        let rows = state.db.friends_posts(user_id, limit, query.offset)?;
        Ok(rows.into_iter().map(post_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(posts, "Friends' posts retrieved successfully")))
}
