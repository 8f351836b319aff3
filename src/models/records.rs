// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user attendance and badge records.
//!
//! Both records are sets with insert-and-report semantics. The store applies
//! these mutations inside a single atomic operation, so the "was it new?"
//! answer is never computed from a stale read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Session;

/// Sessions a user has checked into.
///
/// Stored at `attendance/{email}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub email: String,
    #[serde(default)]
    pub sessions: BTreeSet<String>,
    /// Number of attended sessions in the `Numbered` category
    #[serde(default)]
    pub numbered_sessions: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            sessions: BTreeSet::new(),
            numbered_sessions: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a session to the set.
    ///
    /// Returns `true` if the session was newly added, `false` if it was
    /// already present (no fields change in that case).
    pub fn add_session(&mut self, session: &Session, now: DateTime<Utc>) -> bool {
        if !self.sessions.insert(session.session_id.clone()) {
            return false;
        }
        if session.category.counts_toward_milestones() {
            self.numbered_sessions += 1;
        }
        self.updated_at = now;
        true
    }

    /// Total number of distinct sessions attended.
    pub fn total_sessions(&self) -> u32 {
        self.sessions.len() as u32
    }
}

/// Badges a user has earned.
///
/// Stored at `badges/{email}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRecord {
    pub email: String,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}

impl BadgeRecord {
    pub fn new(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            badges: BTreeSet::new(),
            updated_at: now,
        }
    }

    /// Insert every candidate badge not already held.
    ///
    /// Returns the newly inserted badges in candidate order. Duplicates in
    /// `candidates` are reported once.
    pub fn grant(&mut self, candidates: &[String], now: DateTime<Utc>) -> Vec<String> {
        let granted: Vec<String> = candidates
            .iter()
            .filter(|badge| self.badges.insert((*badge).clone()))
            .cloned()
            .collect();

        if !granted.is_empty() {
            self.updated_at = now;
        }
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionCategory;

    fn make_session(id: &str, category: SessionCategory) -> Session {
        let now = Utc::now();
        Session {
            session_id: id.to_string(),
            title: String::new(),
            track: "A".to_string(),
            category,
            start: now,
            end: now,
            stack: None,
            badge: None,
        }
    }

    #[test]
    fn test_add_session_is_idempotent() {
        let now = Utc::now();
        let mut record = AttendanceRecord::new("a@example.com", now);
        let session = make_session("D1S1", SessionCategory::Numbered);

        assert!(record.add_session(&session, now));
        assert!(!record.add_session(&session, now));

        assert_eq!(record.total_sessions(), 1);
        assert_eq!(record.numbered_sessions, 1);
    }

    #[test]
    fn test_only_numbered_sessions_are_counted() {
        let now = Utc::now();
        let mut record = AttendanceRecord::new("a@example.com", now);

        record.add_session(&make_session("D0S0", SessionCategory::Special), now);
        record.add_session(&make_session("K1", SessionCategory::Keynote), now);
        record.add_session(&make_session("D1S2", SessionCategory::Numbered), now);

        assert_eq!(record.total_sessions(), 3);
        assert_eq!(record.numbered_sessions, 1);
    }

    #[test]
    fn test_grant_reports_only_new_badges() {
        let now = Utc::now();
        let mut record = BadgeRecord::new("a@example.com", now);

        let first = record.grant(&["newperson".to_string()], now);
        assert_eq!(first, vec!["newperson".to_string()]);

        let second = record.grant(&["newperson".to_string(), "rust".to_string()], now);
        assert_eq!(second, vec!["rust".to_string()]);
        assert_eq!(record.badges.len(), 2);
    }

    #[test]
    fn test_grant_deduplicates_candidates() {
        let now = Utc::now();
        let mut record = BadgeRecord::new("a@example.com", now);

        let granted = record.grant(&["rust".to_string(), "rust".to_string()], now);
        assert_eq!(granted, vec!["rust".to_string()]);
        assert!(record.badges.contains("rust"));
    }
}
