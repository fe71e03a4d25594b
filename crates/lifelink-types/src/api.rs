use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    ChallengeStatus, DonationStatus, DonationType, FriendshipStatus, UserRole,
};

// -- JWT Claims --

/// Claims shared by the auth handlers and the bearer middleware. `iss` is the
/// username the token was issued to; `sub` distinguishes access from refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub birthdate: NaiveDate,
    pub city: String,
    pub blood_type: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub birthdate: NaiveDate,
    pub city: String,
    pub blood_type: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub is_eligible: bool,
    pub current_points: i64,
    pub total_points: i64,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub blood_type: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub is_eligible: Option<bool>,
    pub current_points: Option<i64>,
    pub total_points: Option<i64>,
}

// -- Friends --

#[derive(Debug, Serialize)]
pub struct FriendResponse {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateFriendRequest {
    pub status: FriendshipStatus,
}

// -- Donations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDonationRequest {
    pub user_id: i64,
    pub location_id: i64,
    pub donation_type: DonationType,
    pub amount: Option<f64>,
    pub appointment: DateTime<Utc>,
    #[serde(default = "default_donation_status")]
    pub status: DonationStatus,
    #[serde(default)]
    pub enable_joining: bool,
}

fn default_donation_status() -> DonationStatus {
    DonationStatus::Pending
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDonationRequest {
    pub location_id: Option<i64>,
    pub amount: Option<f64>,
    pub appointment: Option<DateTime<Utc>>,
    pub status: Option<DonationStatus>,
    pub enable_joining: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DonationResponse {
    pub id: i64,
    pub user_id: i64,
    pub location_id: i64,
    pub donation_type: DonationType,
    pub amount: Option<f64>,
    pub appointment: DateTime<Utc>,
    pub status: DonationStatus,
    pub enable_joining: bool,
    pub created_at: DateTime<Utc>,
}

// -- Locations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTimeslotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_capacity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLocationRequest {
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub timeslots: Vec<CreateTimeslotRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Serialize)]
pub struct TimeslotResponse {
    pub id: i64,
    pub location_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_capacity: i64,
    pub remaining_capacity: i64,
}

// -- Challenges --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub goal: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reward_points: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChallengeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub goal: Option<f64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub reward_points: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub goal: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reward_points: i64,
    /// Summed qualifying donations across all participants.
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct ParticipationResponse {
    pub challenge_id: i64,
    pub user_id: i64,
    pub status: ChallengeStatus,
    pub joined_at: DateTime<Utc>,
    /// This participant's summed qualifying donations within the window.
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct ContributionResponse {
    pub challenge_id: i64,
    pub total: f64,
}

// -- Posts & kudos --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub post_type: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub post_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateKudosRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct KudosResponse {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub retrieved: bool,
    pub created_at: DateTime<Utc>,
}
