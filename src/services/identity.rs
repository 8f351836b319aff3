// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolves users from a verified token, a raw email, or a public UUID.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::normalize_email;
use crate::models::{PublicProfile, User};
use uuid::Uuid;

#[derive(Clone)]
pub struct IdentityResolver {
    db: Db,
}

impl IdentityResolver {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// User for a verified token subject, created on first sight.
    pub async fn resolve_authenticated(&self, auth: &AuthUser) -> Result<User> {
        self.db
            .get_or_create_user(&normalize_email(&auth.email), chrono::Utc::now())
            .await
    }

    /// Existing user by email.
    pub async fn resolve_email(&self, email: &str) -> Result<User> {
        self.db
            .get_user(&normalize_email(email))
            .await?
            .ok_or_else(AppError::user_not_found)
    }

    /// User by email, registering them if this is their first appearance.
    pub async fn resolve_or_register_email(&self, email: &str) -> Result<User> {
        self.db
            .get_or_create_user(&normalize_email(email), chrono::Utc::now())
            .await
    }

    /// Profile and owner for a public identifier.
    ///
    /// Malformed identifiers are reported as not found.
    pub async fn resolve_public(&self, uid: &str) -> Result<(PublicProfile, User)> {
        let id = Uuid::parse_str(uid.trim()).map_err(|_| {
            tracing::debug!(uid, "Malformed public identifier");
            AppError::user_not_found()
        })?;

        let profile = self
            .db
            .get_profile(id)
            .await?
            .ok_or_else(AppError::user_not_found)?;
        let user = self
            .db
            .get_user(&profile.email)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        Ok((profile, user))
    }

    /// The user's public profile, created lazily and never changed after.
    pub async fn ensure_profile(&self, user: &User) -> Result<PublicProfile> {
        self.db
            .get_or_create_profile(&user.email, chrono::Utc::now())
            .await
    }
}
