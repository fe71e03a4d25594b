use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use lifelink_db::models::{LocationRow, NewTimeslot, TimeslotRow};
use lifelink_db::time;
use lifelink_types::api::{
    CreateLocationRequest, LocationResponse, TimeslotResponse, UpdateLocationRequest,
};
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// The full-listing cache expires by time only; writes do not evict, so the
/// listing may lag location mutations by up to the TTL.
const LOCATION_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Default)]
pub struct LocationCache {
    cached: Option<(Instant, Vec<LocationResponse>)>,
}

impl LocationCache {
    fn get(&self) -> Option<Vec<LocationResponse>> {
        match &self.cached {
            Some((at, entries)) if at.elapsed() < LOCATION_CACHE_TTL => Some(entries.clone()),
            _ => None,
        }
    }

    fn put(&mut self, entries: Vec<LocationResponse>) {
        self.cached = Some((Instant::now(), entries));
    }
}

fn location_response(row: LocationRow) -> LocationResponse {
    LocationResponse {
        id: row.id,
        name: row.name,
        address: row.address,
        opening_hours: row.opening_hours,
        latitude: row.latitude,
        longitude: row.longitude,
    }
}

fn timeslot_response(row: TimeslotRow) -> TimeslotResponse {
    TimeslotResponse {
        id: row.id,
        location_id: row.location_id,
        start_time: time::from_db(&row.start_time),
        end_time: time::from_db(&row.end_time),
        total_capacity: row.total_capacity,
        remaining_capacity: row.remaining_capacity,
    }
}

fn location_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Location not found with ID {}", id))
}

pub async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = blocking(move || {
        let slots: Vec<NewTimeslot> = req
            .timeslots
            .iter()
            .map(|s| NewTimeslot {
                start_time: time::to_db(s.start_time),
                end_time: time::to_db(s.end_time),
                total_capacity: s.total_capacity,
            })
            .collect();

        let (row, _) = state.db.create_location(
            &req.name,
            &req.address,
            &req.opening_hours,
            &req.latitude,
            &req.longitude,
            &slots,
        )?;
        Ok(location_response(row))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(location, "Location created successfully")),
    ))
}

pub async fn all_locations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cached) = state
        .location_cache
        .lock()
        .map_err(|e| anyhow::anyhow!("location cache lock poisoned: {}", e))?
        .get()
    {
        return Ok(Json(Envelope::ok(cached, "Location(s) retrieved successfully")));
    }

    let cache_state = state.clone();
    let locations = blocking(move || {
        let rows = cache_state.db.all_locations()?;
        Ok(rows.into_iter().map(location_response).collect::<Vec<_>>())
    })
    .await?;

    state
        .location_cache
        .lock()
        .map_err(|e| anyhow::anyhow!("location cache lock poisoned: {}", e))?
        .put(locations.clone());

    Ok(Json(Envelope::ok(locations, "Location(s) retrieved successfully")))
}

pub async fn locations_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = blocking(move || {
        let rows = state.db.locations_by_city(&city)?;
        if rows.is_empty() {
            return Err(ApiError::NotFound(format!("Location not found in city {}", city)));
        }
        Ok(rows.into_iter().map(location_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(locations, "Location(s) retrieved successfully")))
}

pub async fn location_name(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let name = blocking(move || {
        state.db.location_name(id)?.ok_or_else(|| location_not_found(id))
    })
    .await?;

    Ok(Json(Envelope::ok(
        serde_json::json!({ "name": name }),
        "Location retrieved successfully",
    )))
}

pub async fn location_timeslots(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let slots = blocking(move || {
        if state.db.get_location(id)?.is_none() {
            return Err(location_not_found(id));
        }
        let rows = state.db.timeslots_by_location(id)?;
        Ok(rows.into_iter().map(timeslot_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(Envelope::ok(slots, "Timeslots retrieved successfully")))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = blocking(move || {
        state
            .db
            .update_location(id, &req)?
            .map(location_response)
            .ok_or_else(|| location_not_found(id))
    })
    .await?;

    Ok(Json(Envelope::ok(location, "Location updated successfully")))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        if !state.db.delete_location(id)? {
            return Err(location_not_found(id));
        }
        Ok(())
    })
    .await?;

    Ok(Json(Envelope::message_only("Location deleted successfully")))
}
