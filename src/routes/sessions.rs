// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-service check-in for authenticated attendees.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::public_profile::PublicSessions;
use crate::services::RuleSet;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Session routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions", get(get_sessions).post(check_in))
}

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/public/{uid}", get(get_public_sessions))
}

// ─── Attended sessions ───────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub uuid: Uuid,
}

async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<SessionsResponse>> {
    let user = state.identity.resolve_authenticated(&auth).await?;
    let sessions = state.recorder.sessions_attended(&user).await?;
    let profile = state.identity.ensure_profile(&user).await?;

    Ok(Json(SessionsResponse {
        sessions,
        uuid: profile.id,
    }))
}

// ─── Check-in ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 64))]
    pub track: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct CheckInResponse {
    pub user: String,
    pub success: bool,
    pub badge_earned: bool,
    pub badges_earned: Vec<String>,
}

/// Check into whatever session is running on the requested track.
async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckInResponse>)> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    payload.validate()?;

    let user = state.identity.resolve_authenticated(&auth).await?;
    // Nothing is written unless a session is active
    let session = state
        .recorder
        .active_session(payload.track.trim(), Utc::now())
        .await?;

    let update = state.recorder.record_attendance(&user, &session).await?;
    let outcome = state
        .badges
        .evaluate(&user, &update, &session, RuleSet::Full)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            badge_earned: outcome.badge_earned(),
            badges_earned: outcome.granted,
            user: user.email,
            success: true,
        }),
    ))
}

// ─── Public view ─────────────────────────────────────────────

async fn get_public_sessions(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<PublicSessions>> {
    Ok(Json(state.profiles.public_sessions(&uid).await?))
}
