// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge lookup routes.

use crate::error::{AppError, Result};
use crate::services::public_profile::PublicBadges;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/badges", get(get_badges))
        .route("/badges/public/{uid}", get(get_public_badges))
}

/// Query parameters for badge lookup.
#[derive(Debug, Deserialize, Validate)]
pub struct BadgesQuery {
    #[validate(email)]
    pub email: String,
}

/// A user's badges together with their public identifier.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct BadgesResponse {
    pub email: String,
    pub badges: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub uuid: Uuid,
}

async fn get_badges(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<BadgesQuery>, QueryRejection>,
) -> Result<Json<BadgesResponse>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    query.validate()?;

    let user = state.identity.resolve_email(&query.email).await?;
    let record = state
        .db
        .get_badges(&user.email)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    let profile = state.identity.ensure_profile(&user).await?;

    Ok(Json(BadgesResponse {
        email: user.email,
        badges: record.badges.into_iter().collect(),
        uuid: profile.id,
    }))
}

async fn get_public_badges(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<PublicBadges>> {
    Ok(Json(state.profiles.public_badges(&uid).await?))
}
