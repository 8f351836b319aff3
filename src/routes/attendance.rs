// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kiosk check-in by email and session ID.

use crate::error::{AppError, Result};
use crate::services::RuleSet;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/attendance", post(mark_attendance))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkAttendanceRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub session: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct MarkAttendanceResponse {
    pub email: String,
    pub success: bool,
    pub badge_earned: bool,
    pub badges_earned: Vec<String>,
    /// Numbered sessions attended so far
    pub count: u32,
    /// Stack tag of the session, if any
    pub session_type: Option<String>,
}

/// Record a check-in and evaluate the legacy rule set.
///
/// Unknown emails are registered on first check-in; unknown sessions are
/// rejected before anything is written.
async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<MarkAttendanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MarkAttendanceResponse>)> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    payload.validate()?;

    let session = state.recorder.session(&payload.session).await?;
    let user = state
        .identity
        .resolve_or_register_email(&payload.email)
        .await?;

    let update = state.recorder.record_attendance(&user, &session).await?;
    let outcome = state
        .badges
        .evaluate(&user, &update, &session, RuleSet::Legacy)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MarkAttendanceResponse {
            badge_earned: outcome.badge_earned(),
            badges_earned: outcome.granted,
            count: update.record.numbered_sessions,
            session_type: session.stack_tag().map(str::to_string),
            email: user.email,
            success: true,
        }),
    ))
}
