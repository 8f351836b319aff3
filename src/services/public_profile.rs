// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Privacy-redacted public views of a user's badges and attendance.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::user::redact_email;
use crate::services::IdentityResolver;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Public badge view.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct PublicBadges {
    /// Redacted email, e.g. `ali*****@example.com`
    pub email: String,
    pub badges: Vec<String>,
}

/// Public attendance view.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct PublicSessions {
    /// Redacted email, e.g. `ali*****@example.com`
    pub email: String,
    pub sessions: Vec<String>,
}

#[derive(Clone)]
pub struct PublicProfileProjector {
    db: Db,
    identity: IdentityResolver,
}

impl PublicProfileProjector {
    pub fn new(db: Db) -> Self {
        Self {
            identity: IdentityResolver::new(db.clone()),
            db,
        }
    }

    /// Badges for a public identifier. Not found if the user has none.
    pub async fn public_badges(&self, uid: &str) -> Result<PublicBadges> {
        let (_, user) = self.identity.resolve_public(uid).await?;
        let record = self
            .db
            .get_badges(&user.email)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        Ok(PublicBadges {
            email: redact_email(&user.email),
            badges: record.badges.into_iter().collect(),
        })
    }

    /// Attended sessions for a public identifier. Not found if the user has
    /// never checked in.
    pub async fn public_sessions(&self, uid: &str) -> Result<PublicSessions> {
        let (_, user) = self.identity.resolve_public(uid).await?;
        let record = self
            .db
            .get_attendance(&user.email)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        Ok(PublicSessions {
            email: redact_email(&user.email),
            sessions: record.sessions.into_iter().collect(),
        })
    }
}
