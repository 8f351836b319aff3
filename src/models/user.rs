// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and public profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of leading characters kept when redacting an email.
const REDACT_KEEP_CHARS: usize = 3;
const REDACT_MASK: &str = "*****";

/// Conference attendee, keyed by normalized email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Normalized email (also used as document ID)
    pub email: String,
    /// When the user was first seen
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: normalize_email(email),
            created_at: now,
        }
    }
}

/// Opaque public identifier for a user.
///
/// Created lazily the first time a lookup needs it and never modified
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    /// Public UUID (also used as document ID)
    pub id: Uuid,
    /// Owner's normalized email
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl PublicProfile {
    /// Build a fresh profile with a random v4 UUID.
    pub fn generate(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            created_at: now,
        }
    }
}

/// Canonical form of an email used as the user key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Redact an email for public display: `alice@example.com` -> `ali*****@example.com`.
///
/// Works on characters, not bytes, so multibyte local parts are never split.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let kept: String = local.chars().take(REDACT_KEEP_CHARS).collect();
            format!("{}{}@{}", kept, REDACT_MASK, domain)
        }
        None => {
            let kept: String = email.chars().take(REDACT_KEEP_CHARS).collect();
            format!("{}{}", kept, REDACT_MASK)
        }
    }
}
