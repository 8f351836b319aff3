// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use checkin_badges::config::Config;
use checkin_badges::db::{Db, FirestoreDb};
use checkin_badges::middleware::auth::Claims;
use checkin_badges::models::{Session, SessionCategory, SessionCountThresholdRule};
use checkin_badges::routes::create_router;
use checkin_badges::AppState;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    Db::Firestore(
        FirestoreDb::new("test-project")
            .await
            .expect("Failed to connect to Firestore emulator"),
    )
}

/// Build a session on `track` running from `start_offset` to `end_offset`
/// minutes relative to now.
#[allow(dead_code)]
pub fn session(
    id: &str,
    track: &str,
    category: SessionCategory,
    start_offset: i64,
    end_offset: i64,
) -> Session {
    let now = Utc::now();
    Session {
        session_id: id.to_string(),
        title: format!("Session {}", id),
        track: track.to_string(),
        category,
        start: now + Duration::minutes(start_offset),
        end: now + Duration::minutes(end_offset),
        stack: None,
        badge: None,
    }
}

/// Conference schedule used by the API tests.
///
/// Tracks A and B each have one session running now. Track Z only has a
/// session that already ended. D1S1..D1S9 are numbered past sessions that
/// the kiosk endpoint can still record.
#[allow(dead_code)]
pub fn test_schedule() -> Vec<Session> {
    let mut sessions = vec![
        session("D0S0", "A", SessionCategory::Special, -240, -180),
        session("NOW-A", "A", SessionCategory::Numbered, -10, 30),
        session("NOW-B", "B", SessionCategory::Numbered, -10, 30),
        session("OVER-Z", "Z", SessionCategory::Numbered, -120, -60),
        session("KEY1", "A", SessionCategory::Keynote, -300, -250),
    ];
    for i in 1..=9 {
        sessions.push(session(
            &format!("D1S{}", i),
            "C",
            SessionCategory::Numbered,
            -600 + i * 50,
            -560 + i * 50,
        ));
    }

    let mut rust = session("RUST1", "C", SessionCategory::Numbered, -90, -45);
    rust.stack = Some("rust".to_string());
    rust.badge = Some("crab".to_string());
    sessions.push(rust);

    sessions
}

/// Create a test app backed by a seeded in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::in_memory();
    db.upsert_sessions(&test_schedule())
        .await
        .expect("seed sessions");
    db.upsert_threshold_rules(&[SessionCountThresholdRule {
        count: 2,
        badge: "double".to_string(),
    }])
    .await
    .expect("seed rules");

    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test JWT token for an attendee.
#[allow(dead_code)]
pub fn create_test_jwt(email: &str, signing_key: &[u8]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: email.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// GET request, optionally authenticated.
#[allow(dead_code)]
pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
