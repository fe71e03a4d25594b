use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use lifelink_db::Database;
use lifelink_db::models::{ChallengeRow, ChallengeUserRow};
use lifelink_db::time;
use lifelink_types::api::{
    ChallengeResponse, ContributionResponse, CreateChallengeRequest, ParticipationResponse,
    UpdateChallengeRequest,
};
use lifelink_types::enums::ChallengeStatus;
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

fn challenge_response(row: ChallengeRow, total: f64) -> ChallengeResponse {
    ChallengeResponse {
        id: row.id,
        title: row.title,
        description: row.description,
        location: row.location,
        goal: row.goal,
        start: time::from_db(&row.start),
        end: time::from_db(&row.end),
        reward_points: row.reward_points,
        total,
    }
}

fn participation_response(row: ChallengeUserRow, progress: f64) -> ParticipationResponse {
    ParticipationResponse {
        challenge_id: row.challenge_id,
        user_id: row.user_id,
        status: row.status.parse().unwrap_or_else(|e| {
            warn!(
                "Corrupt participation status for challenge {} user {}: {}",
                row.challenge_id, row.user_id, e
            );
            ChallengeStatus::Active
        }),
        joined_at: time::from_db(&row.joined_at),
        progress,
    }
}

/// Resolve the challenge before any aggregation: a missing challenge is a
/// not-found condition, never a silent zero total.
fn require_challenge(db: &Database, id: i64) -> Result<ChallengeRow, ApiError> {
    db.get_challenge(id)?.ok_or_else(|| ApiError::challenge_not_found(id))
}

fn require_user(db: &Database, id: i64) -> Result<(), ApiError> {
    if !db.user_exists(id)? {
        return Err(ApiError::user_not_found(id));
    }
    Ok(())
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.end <= req.start {
        return Err(ApiError::Validation("Challenge window must end after it starts".into()));
    }

    let challenge = blocking(move || {
        let row = state.db.create_challenge(
            &req.title,
            &req.description,
            &req.location,
            req.goal,
            &time::to_db(req.start),
            &time::to_db(req.end),
            req.reward_points,
        )?;
        Ok(challenge_response(row, 0.0))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(challenge, "Challenge created successfully")),
    ))
}

pub async fn list_challenges(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let challenges = blocking(move || {
        let rows = state.db.list_challenges()?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let total = state.db.challenge_total(row.id, &row.start, &row.end)?;
            out.push(challenge_response(row, total));
        }
        Ok(out)
    })
    .await?;

    Ok(Json(Envelope::ok(challenges, "Challenges retrieved successfully")))
}

pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let challenge = blocking(move || {
        let row = require_challenge(&state.db, id)?;
        let total = state.db.challenge_total(row.id, &row.start, &row.end)?;
        Ok(challenge_response(row, total))
    })
    .await?;

    Ok(Json(Envelope::ok(challenge, "Challenge retrieved successfully")))
}

pub async fn update_challenge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateChallengeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let challenge = blocking(move || {
        let row = state
            .db
            .update_challenge(id, &req)?
            .ok_or_else(|| ApiError::challenge_not_found(id))?;
        let total = state.db.challenge_total(row.id, &row.start, &row.end)?;
        Ok(challenge_response(row, total))
    })
    .await?;

    Ok(Json(Envelope::ok(challenge, "Challenge updated successfully")))
}

pub async fn delete_challenge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.delete_challenge(id)? {
            return Err(ApiError::challenge_not_found(id));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Challenge deleted successfully")))
}

pub async fn join_challenge(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let participation = blocking(move || {
        require_user(&state.db, user_id)?;
        require_challenge(&state.db, id)?;
        state
            .db
            .join_challenge(id, user_id)?
            .map(|row| participation_response(row, 0.0))
            .ok_or_else(|| {
                ApiError::Conflict(format!("User {} already joined challenge {}", user_id, id))
            })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(participation, "User added to challenge successfully")),
    ))
}

pub async fn leave_challenge(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        require_user(&state.db, user_id)?;
        require_challenge(&state.db, id)?;
        if !state.db.leave_challenge(id, user_id)? {
            return Err(ApiError::NotFound(format!(
                "User {} is not a participant of challenge {}",
                user_id, id
            )));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("User deleted from challenge successfully")))
}

pub async fn challenge_participants(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let participants = blocking(move || {
        let challenge = require_challenge(&state.db, id)?;
        let rows = state.db.participants(id)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let progress = state.db.challenge_user_total(
                id,
                row.user_id,
                &challenge.start,
                &challenge.end,
            )?;
            out.push(participation_response(row, progress));
        }
        Ok(out)
    })
    .await?;

    Ok(Json(Envelope::ok(participants, "Users retrieved successfully")))
}

pub async fn challenges_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let participations = blocking(move || {
        require_user(&state.db, user_id)?;
        let rows = state.db.participations_by_user(user_id)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            // cascade rules guarantee the challenge exists; a missing
            // window still just contributes nothing
            let progress = match state.db.get_challenge(row.challenge_id)? {
                Some(challenge) => state.db.challenge_user_total(
                    row.challenge_id,
                    user_id,
                    &challenge.start,
                    &challenge.end,
                )?,
                None => 0.0,
            };
            out.push(participation_response(row, progress));
        }
        Ok(out)
    })
    .await?;

    Ok(Json(Envelope::ok(participations, "Challenges retrieved successfully")))
}

pub async fn challenge_total(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let total = blocking(move || {
        let challenge = require_challenge(&state.db, id)?;
        let total = state.db.challenge_total(id, &challenge.start, &challenge.end)?;
        Ok(ContributionResponse { challenge_id: id, total })
    })
    .await?;

    Ok(Json(Envelope::ok(total, "Challenge total retrieved successfully")))
}

pub async fn challenge_user_total(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let total = blocking(move || {
        require_user(&state.db, user_id)?;
        let challenge = require_challenge(&state.db, id)?;
        let total =
            state.db.challenge_user_total(id, user_id, &challenge.start, &challenge.end)?;
        Ok(ContributionResponse { challenge_id: id, total })
    })
    .await?;

    Ok(Json(Envelope::ok(total, "Challenge total retrieved successfully")))
}

pub async fn challenge_friends_total(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let total = blocking(move || {
        require_user(&state.db, user_id)?;
        let challenge = require_challenge(&state.db, id)?;
        let total =
            state.db.challenge_friends_total(id, user_id, &challenge.start, &challenge.end)?;
        Ok(ContributionResponse { challenge_id: id, total })
    })
    .await?;

    Ok(Json(Envelope::ok(total, "Challenge total retrieved successfully")))
}
