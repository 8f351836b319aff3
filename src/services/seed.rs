// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conference schedule and threshold rules loaded from a JSON file.
//!
//! ```json
//! {
//!   "sessions": [
//!     { "session_id": "D1S1", "track": "A", "category": "numbered",
//!       "start": "2026-10-16T09:00:00Z", "end": "2026-10-16T09:45:00Z",
//!       "stack": "rust" }
//!   ],
//!   "threshold_rules": [ { "count": 3, "badge": "hat-trick" } ]
//! }
//! ```

use crate::db::Db;
use crate::error::AppError;
use crate::models::{Session, SessionCountThresholdRule};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Sessions and rules to upsert at startup.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub threshold_rules: Vec<SessionCountThresholdRule>,
}

impl SeedData {
    /// Load seed data from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| SeedError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Parse and validate seed data from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, SeedError> {
        let data: SeedData =
            serde_json::from_str(json_data).map_err(|e| SeedError::ParseError(e.to_string()))?;

        let mut seen = HashSet::new();
        for session in &data.sessions {
            if session.session_id.trim().is_empty() {
                return Err(SeedError::InvalidSession(
                    "<empty>".to_string(),
                    "session_id is empty".to_string(),
                ));
            }
            if session.end < session.start {
                return Err(SeedError::InvalidSession(
                    session.session_id.clone(),
                    "end is before start".to_string(),
                ));
            }
            if !seen.insert(session.session_id.as_str()) {
                return Err(SeedError::InvalidSession(
                    session.session_id.clone(),
                    "duplicate session_id".to_string(),
                ));
            }
        }

        if let Some(rule) = data.threshold_rules.iter().find(|r| r.badge.trim().is_empty()) {
            return Err(SeedError::InvalidRule(rule.count));
        }

        Ok(data)
    }

    /// Upsert everything into the store.
    pub async fn apply(&self, db: &Db) -> Result<(), AppError> {
        db.upsert_sessions(&self.sessions).await?;
        db.upsert_threshold_rules(&self.threshold_rules).await?;

        tracing::info!(
            sessions = self.sessions.len(),
            threshold_rules = self.threshold_rules.len(),
            "Seed data applied"
        );
        Ok(())
    }
}

/// Errors from loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse seed JSON: {0}")]
    ParseError(String),

    #[error("Invalid session {0}: {1}")]
    InvalidSession(String, String),

    #[error("Threshold rule for count {0} has an empty badge")]
    InvalidRule(u32),
}
