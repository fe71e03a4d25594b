pub mod auth;
pub mod challenges;
pub mod donations;
pub mod error;
pub mod friends;
pub mod locations;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod users;

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tracing::error;

use lifelink_db::Database;
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::locations::LocationCache;
use crate::middleware::require_auth;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub location_cache: Mutex<LocationCache>,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            location_cache: Mutex::new(LocationCache::default()),
        })
    }
}

/// Run a closure of blocking DB work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            Err(ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e)))
        }
    }
}

async fn root() -> impl IntoResponse {
    Json(Envelope::ok(
        serde_json::json!({"name": "lifelink", "version": env!("CARGO_PKG_VERSION")}),
        "Welcome to the Lifelink API",
    ))
}

/// Full route tree. Everything except `/` and `/auth/*` sits behind the
/// bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .with_state(state.clone());

    let protected_routes = Router::new()
        // users
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/username/{username}", get(users::get_user_by_username))
        // friends
        .route("/users/{id}/friends", get(friends::list_friends))
        .route("/users/{id}/friends/requests", get(friends::incoming_requests))
        .route("/users/{id}/friends/sent", get(friends::sent_requests))
        .route(
            "/users/{id}/friends/{friend_id}",
            post(friends::send_request)
                .put(friends::respond_to_request)
                .delete(friends::remove_friend),
        )
        // notifications
        .route(
            "/users/{id}/notifications",
            post(notifications::create_notification).get(notifications::list_notifications),
        )
        .route(
            "/users/{id}/notifications/{notification_id}",
            delete(notifications::delete_notification),
        )
        // donations
        .route("/donations", post(donations::create_donation))
        .route(
            "/donations/{id}",
            get(donations::get_donation)
                .put(donations::update_donation)
                .delete(donations::delete_donation),
        )
        .route("/donations/user/{user_id}", get(donations::donations_by_user))
        .route("/donations/user/{user_id}/friends", get(donations::friends_donations))
        // locations
        .route("/locations", post(locations::create_location).get(locations::all_locations))
        .route("/locations/city/{city}", get(locations::locations_by_city))
        .route(
            "/locations/{id}",
            put(locations::update_location).delete(locations::delete_location),
        )
        .route("/locations/{id}/name", get(locations::location_name))
        .route("/locations/{id}/timeslots", get(locations::location_timeslots))
        // challenges
        .route("/challenges", post(challenges::create_challenge).get(challenges::list_challenges))
        .route(
            "/challenges/{id}",
            get(challenges::get_challenge)
                .put(challenges::update_challenge)
                .delete(challenges::delete_challenge),
        )
        .route("/challenges/{id}/users", get(challenges::challenge_participants))
        .route(
            "/challenges/{id}/users/{user_id}",
            post(challenges::join_challenge).delete(challenges::leave_challenge),
        )
        .route("/challenges/user/{user_id}", get(challenges::challenges_by_user))
        .route("/challenges/{id}/total", get(challenges::challenge_total))
        .route(
            "/challenges/{id}/users/{user_id}/total",
            get(challenges::challenge_user_total),
        )
        .route(
            "/challenges/{id}/friends/{user_id}/total",
            get(challenges::challenge_friends_total),
        )
        // posts & kudos
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", delete(posts::delete_post))
        .route("/posts/user/{user_id}", get(posts::posts_by_user))
        .route("/posts/friends/{user_id}", get(posts::friends_posts))
        .route("/posts/{id}/kudos", post(posts::add_kudos).get(posts::kudos_by_post))
        .route("/posts/{id}/kudos/{user_id}", delete(posts::delete_kudos))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
