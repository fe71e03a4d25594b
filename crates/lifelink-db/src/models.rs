/// Database row types — these map directly to SQLite rows. Status columns
/// stay as text here; the API layer converts them to the shared enums.
/// Distinct from lifelink-types DTOs to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub birthdate: String,
    pub city: String,
    pub blood_type: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub is_eligible: bool,
    pub current_points: i64,
    pub total_points: i64,
    pub role: String,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub birthdate: String,
    pub city: &'a str,
    pub blood_type: Option<&'a str>,
    pub nationality: Option<&'a str>,
    pub gender: Option<&'a str>,
}

pub struct DonationRow {
    pub id: i64,
    pub user_id: i64,
    pub location_id: i64,
    pub donation_type: String,
    pub amount: Option<f64>,
    pub appointment: String,
    pub status: String,
    pub enable_joining: bool,
    pub created_at: String,
}

pub struct NewDonation {
    pub user_id: i64,
    pub location_id: i64,
    pub donation_type: String,
    pub amount: Option<f64>,
    pub appointment: String,
    pub status: String,
    pub enable_joining: bool,
}

pub struct LocationRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub latitude: String,
    pub longitude: String,
}

pub struct TimeslotRow {
    pub id: i64,
    pub location_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub total_capacity: i64,
    pub remaining_capacity: i64,
}

pub struct NewTimeslot {
    pub start_time: String,
    pub end_time: String,
    pub total_capacity: i64,
}

pub struct ChallengeRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub goal: f64,
    pub start: String,
    pub end: String,
    pub reward_points: i64,
}

pub struct ChallengeUserRow {
    pub challenge_id: i64,
    pub user_id: i64,
    pub status: String,
    pub joined_at: String,
}

pub struct FriendRow {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub post_type: String,
    pub created_at: String,
}

pub struct KudosRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub retrieved: bool,
    pub created_at: String,
}
