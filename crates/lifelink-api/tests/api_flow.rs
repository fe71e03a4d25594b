use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use lifelink_api::AppStateInner;
use lifelink_db::Database;

fn test_app() -> Router {
    let db = Database::open_in_memory().unwrap();
    lifelink_api::router(AppStateInner::new(db, "test-secret".into()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "first_name": "Test",
            "last_name": "User",
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct-horse",
            "birthdate": "1990-06-01",
            "city": "Amsterdam",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let id = body["data"]["user"]["id"].as_i64().unwrap();
    let token = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    (id, token)
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();

    let (status, _) = send(&app, "GET", "/users/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/users/1", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn register_login_and_refresh() {
    let app = test_app();
    let (id, token) = register(&app, "alice").await;

    // duplicate username is a conflict
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "first_name": "Other",
            "last_name": "Alice",
            "username": "alice",
            "email": "alice2@example.com",
            "password": "correct-horse",
            "birthdate": "1991-01-01",
            "city": "Utrecht",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], id);
    let refresh_token = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();

    // a refresh token is not an access token
    let (status, _) = send(&app, "GET", &format!("/users/{}", id), Some(&refresh_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/users/{}", id), Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    // wrong password
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let _ = token;
}

#[tokio::test]
async fn envelope_carries_templated_not_found() {
    let app = test_app();
    let (_, token) = register(&app, "alice").await;

    let (status, body) = send(&app, "GET", "/users/999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "User not found with ID 999");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn friend_flow_and_donation_feed() {
    let app = test_app();
    let (alice, token) = register(&app, "alice").await;
    let (bob, bob_token) = register(&app, "bob").await;

    // request + accept (bob responds to alice's request)
    let (status, _) = send(
        &app,
        "POST",
        &format!("/users/{}/friends/{}", alice, bob),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{}/friends/{}", bob, alice),
        Some(&bob_token),
        Some(json!({"status": "accepted"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    // bob opens a joinable future donation slot
    let (status, body) = send(
        &app,
        "POST",
        "/locations",
        Some(&token),
        Some(json!({
            "name": "Center",
            "address": "Main Street 1, Amsterdam",
            "opening_hours": "09:00-17:00",
            "latitude": "52.37",
            "longitude": "4.89",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let location = body["data"]["id"].as_i64().unwrap();

    let appointment = (chrono::Utc::now() + chrono::Duration::days(7)).to_rfc3339();
    let (status, _) = send(
        &app,
        "POST",
        "/donations",
        Some(&bob_token),
        Some(json!({
            "user_id": bob,
            "location_id": location,
            "donation_type": "blood",
            "appointment": appointment,
            "enable_joining": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/donations/user/{}/friends", alice),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["user_id"], bob);

    // bob's feed does not include his own slot
    let (status, body) = send(
        &app,
        "GET",
        &format!("/donations/user/{}/friends", bob),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn challenge_totals_over_http() {
    let app = test_app();
    let (alice, token) = register(&app, "alice").await;

    let (_, body) = send(
        &app,
        "POST",
        "/locations",
        Some(&token),
        Some(json!({
            "name": "Center",
            "address": "Main Street 1, Amsterdam",
            "opening_hours": "09:00-17:00",
            "latitude": "52.37",
            "longitude": "4.89",
        })),
    )
    .await;
    let location = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/challenges",
        Some(&token),
        Some(json!({
            "title": "January drive",
            "description": "Donate in January",
            "location": "Amsterdam",
            "goal": 100.0,
            "start": "2024-01-01T00:00:00Z",
            "end": "2024-01-31T23:59:59Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let challenge = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/challenges/{}/users/{}", challenge, alice),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // in-window and out-of-window donations
    for (appointment, amount) in
        [("2024-01-15T10:00:00Z", 50.0), ("2024-02-05T10:00:00Z", 100.0)]
    {
        let (status, _) = send(
            &app,
            "POST",
            "/donations",
            Some(&token),
            Some(json!({
                "user_id": alice,
                "location_id": location,
                "donation_type": "plasma",
                "amount": amount,
                "appointment": appointment,
                "status": "completed",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/challenges/{}/total", challenge),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 50.0);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/challenges/{}/users/{}/total", challenge, alice),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 50.0);

    // a missing challenge is 404, never a zero total
    let (status, body) = send(&app, "GET", "/challenges/999/total", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Challenge not found with ID 999");
}
