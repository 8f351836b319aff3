// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkin-Badges: conference attendance and gamification backend
//!
//! Attendees check into sessions; each check-in is recorded once and may
//! award badges for registration, session milestones, topic stacks and
//! data-driven thresholds. Public, email-redacted profiles are served by an
//! opaque UUID.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{AttendanceRecorder, BadgeEngine, IdentityResolver, PublicProfileProjector};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub identity: IdentityResolver,
    pub recorder: AttendanceRecorder,
    pub badges: BadgeEngine,
    pub profiles: PublicProfileProjector,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self {
            identity: IdentityResolver::new(db.clone()),
            recorder: AttendanceRecorder::new(db.clone()),
            badges: BadgeEngine::new(db.clone()),
            profiles: PublicProfileProjector::new(db.clone()),
            config,
            db,
        }
    }
}
