// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token verification tests for the auth middleware.

use axum::http::StatusCode;
use checkin_badges::middleware::auth::Claims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt, get};

#[test]
fn test_token_claims_roundtrip() {
    let key = b"test_jwt_key_32_bytes_minimum!!";
    let token = create_test_jwt("alice@example.com", key);

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(key),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();

    assert_eq!(data.claims.sub, "alice@example.com");
    assert!(data.claims.exp > data.claims.iat);
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let (app, state) = create_test_app().await;
    let token = create_test_jwt("alice@example.com", &state.config.jwt_signing_key);

    let response = app.oneshot(get("/sessions", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (app, state) = create_test_app().await;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: "alice@example.com".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&state.config.jwt_signing_key),
    )
    .unwrap();

    let response = app.oneshot(get("/sessions", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_subject_is_rejected() {
    let (app, state) = create_test_app().await;
    let token = create_test_jwt("   ", &state.config.jwt_signing_key);

    let response = app.oneshot(get("/sessions", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_header_is_rejected() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(get("/sessions", Some("not.a.jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
