use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use lifelink_db::models::NewUser;
use lifelink_db::time;
use lifelink_types::api::{
    AuthResponse, Claims, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, TokenPair,
};
use lifelink_types::response::Envelope;

use crate::error::ApiError;
use crate::users::user_response;
use crate::{AppState, blocking};

pub const ACCESS_SUBJECT: &str = "access";
pub const REFRESH_SUBJECT: &str = "refresh";

fn access_ttl() -> Duration {
    Duration::minutes(1)
}

fn refresh_ttl() -> Duration {
    Duration::hours(720)
}

fn issue_token(secret: &str, username: &str, subject: &str, ttl: Duration) -> anyhow::Result<String> {
    let claims = Claims {
        iss: username.to_string(),
        sub: subject.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn issue_token_pair(secret: &str, username: &str) -> anyhow::Result<TokenPair> {
    Ok(TokenPair {
        access_token: issue_token(secret, username, ACCESS_SUBJECT, access_ttl())?,
        refresh_token: issue_token(secret, username, REFRESH_SUBJECT, refresh_ttl())?,
    })
}

/// Validate a token and check it was issued for the expected purpose. A
/// refresh token never authenticates a request and vice versa.
pub fn decode_token(secret: &str, token: &str, expected_subject: &str) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    if data.claims.sub != expected_subject {
        return Err(ApiError::Unauthorized);
    }
    Ok(data.claims)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("Password must be at least 8 characters".into()));
    }

    let secret = state.jwt_secret.clone();
    let response = blocking(move || {
        if state.db.username_taken(&req.username)? {
            return Err(ApiError::Conflict(format!("Username {} is already taken", req.username)));
        }
        if state.db.email_taken(&req.email)? {
            return Err(ApiError::Conflict(format!("Email {} is already registered", req.email)));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        let user = state.db.create_user(&NewUser {
            first_name: &req.first_name,
            last_name: &req.last_name,
            username: &req.username,
            email: &req.email,
            password_hash: &password_hash,
            birthdate: time::date_to_db(req.birthdate),
            city: &req.city,
            blood_type: req.blood_type.as_deref(),
            nationality: req.nationality.as_deref(),
            gender: req.gender.as_deref(),
        })?;

        let tokens = issue_token_pair(&secret, &user.username)?;
        Ok(AuthResponse {
            user: user_response(user),
            tokens,
        })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::created(response, "User registered successfully")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = state.jwt_secret.clone();
    let response = blocking(move || {
        let user = state
            .db
            .get_user_by_username(&req.username)?
            .ok_or(ApiError::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {}", e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        let tokens = issue_token_pair(&secret, &user.username)?;
        Ok(AuthResponse {
            user: user_response(user),
            tokens,
        })
    })
    .await?;

    Ok(Json(Envelope::ok(response, "Login successful")))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = decode_token(&state.jwt_secret, &req.refresh_token, REFRESH_SUBJECT)?;
    let access_token = issue_token(&state.jwt_secret, &claims.iss, ACCESS_SUBJECT, access_ttl())
        .map_err(ApiError::Internal)?;

    Ok(Json(Envelope::ok(
        RefreshResponse { access_token },
        "Access token refreshed",
    )))
}
