use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use lifelink_db::models::{DonationRow, NewDonation};
use lifelink_db::time;
use lifelink_types::api::{CreateDonationRequest, DonationResponse, UpdateDonationRequest};
use lifelink_types::enums::{DonationStatus, DonationType};
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

pub(crate) fn donation_response(row: DonationRow) -> DonationResponse {
    DonationResponse {
        id: row.id,
        user_id: row.user_id,
        location_id: row.location_id,
        donation_type: row.donation_type.parse().unwrap_or_else(|e| {
            warn!("Corrupt donation type on donation {}: {}", row.id, e);
            DonationType::Blood
        }),
        amount: row.amount,
        appointment: time::from_db(&row.appointment),
        status: row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt donation status on donation {}: {}", row.id, e);
            DonationStatus::Pending
        }),
        enable_joining: row.enable_joining,
        created_at: time::from_db(&row.created_at),
    }
}

fn donation_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Donation not found with ID {}", id))
}

pub async fn create_donation(
    State(state): State<AppState>,
    Json(req): Json<CreateDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = blocking(move || {
        if !state.db.user_exists(req.user_id)? {
            return Err(ApiError::user_not_found(req.user_id));
        }
        if state.db.get_location(req.location_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Location not found with ID {}",
                req.location_id
            )));
        }

        let row = state.db.create_donation(&NewDonation {
            user_id: req.user_id,
            location_id: req.location_id,
            donation_type: req.donation_type.as_str().to_string(),
            amount: req.amount,
            appointment: time::to_db(req.appointment),
            status: req.status.as_str().to_string(),
            enable_joining: req.enable_joining,
        })?;
        Ok(donation_response(row))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(donation, "Donation created successfully")),
    ))
}

pub async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = blocking(move || {
        state
            .db
            .get_donation(id)?
            .map(donation_response)
            .ok_or_else(|| donation_not_found(id))
    })
    .await?;

    Ok(Json(Envelope::ok(donation, "Donation retrieved successfully")))
}

pub async fn update_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = blocking(move || {
        let existing = state.db.get_donation(id)?.ok_or_else(|| donation_not_found(id))?;

        // terminal states are frozen
        let status: Result<DonationStatus, _> = existing.status.parse();
        if matches!(status, Ok(DonationStatus::Cancelled | DonationStatus::Rejected)) {
            return Err(ApiError::Validation(format!(
                "Donation {} is in terminal state {} and cannot be updated",
                id, existing.status
            )));
        }

        let row = state.db.update_donation(id, &req)?.ok_or_else(|| donation_not_found(id))?;
        Ok(donation_response(row))
    })
    .await?;

    Ok(Json(Envelope::ok(donation, "Donation updated successfully")))
}

pub async fn delete_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.delete_donation(id)? {
            return Err(donation_not_found(id));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Donation deleted successfully")))
}

pub async fn donations_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let donations = blocking(move || {
        if !state.db.user_exists(user_id)? {
            return Err(ApiError::user_not_found(user_id));
        }
        let rows = state.db.donations_by_user(user_id)?;
        Ok(rows.into_iter().map(donation_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(donations, "Donations retrieved successfully")))
}

/// Joinable donation slots owned by the requester's accepted friends, with
/// strictly-future appointments. Empty when nothing qualifies.
pub async fn friends_donations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let donations = blocking(move || {
        if !state.db.user_exists(user_id)? {
            return Err(ApiError::user_not_found(user_id));
        }
        let rows = state.db.friends_donations(user_id, &time::now_db())?;
        Ok(rows.into_iter().map(donation_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(donations, "Friends' donations retrieved successfully")))
}
