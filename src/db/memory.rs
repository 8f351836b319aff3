// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Read-modify-write operations run under the map's per-key entry lock, which
//! gives the same at-most-once guarantees as the Firestore transactions.

use crate::db::AttendanceUpdate;
use crate::models::{
    AttendanceRecord, BadgeRecord, PublicProfile, Session, SessionCountThresholdRule, User,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: DashMap<String, User>,
    /// email -> profile
    profiles_by_email: DashMap<String, PublicProfile>,
    /// uuid -> email
    profile_ids: DashMap<Uuid, String>,
    sessions: DashMap<String, Session>,
    threshold_rules: DashMap<String, SessionCountThresholdRule>,
    attendance: DashMap<String, AttendanceRecord>,
    badges: DashMap<String, BadgeRecord>,
}

/// In-memory database. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, email: &str) -> Option<User> {
        self.tables.users.get(email).map(|u| u.value().clone())
    }

    pub fn get_or_create_user(&self, email: &str, now: DateTime<Utc>) -> User {
        self.tables
            .users
            .entry(email.to_string())
            .or_insert_with(|| User::new(email, now))
            .value()
            .clone()
    }

    pub fn get_profile(&self, id: Uuid) -> Option<PublicProfile> {
        let email = self.tables.profile_ids.get(&id)?.value().clone();
        self.tables
            .profiles_by_email
            .get(&email)
            .map(|p| p.value().clone())
    }

    pub fn get_or_create_profile(&self, email: &str, now: DateTime<Utc>) -> PublicProfile {
        self.tables
            .profiles_by_email
            .entry(email.to_string())
            .or_insert_with(|| {
                let profile = PublicProfile::generate(email, now);
                self.tables
                    .profile_ids
                    .insert(profile.id, profile.email.clone());
                tracing::info!(email, uuid = %profile.id, "Created public profile");
                profile
            })
            .value()
            .clone()
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.tables
            .sessions
            .get(session_id)
            .map(|s| s.value().clone())
    }

    pub fn sessions_for_track(&self, track: &str) -> Vec<Session> {
        self.tables
            .sessions
            .iter()
            .filter(|s| s.track == track)
            .map(|s| s.value().clone())
            .collect()
    }

    pub fn upsert_session(&self, session: &Session) {
        self.tables
            .sessions
            .insert(session.session_id.clone(), session.clone());
    }

    pub fn threshold_rules_for_count(&self, count: u32) -> Vec<SessionCountThresholdRule> {
        self.tables
            .threshold_rules
            .iter()
            .filter(|r| r.count == count)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn upsert_threshold_rule(&self, rule: &SessionCountThresholdRule) {
        self.tables
            .threshold_rules
            .insert(rule.document_id(), rule.clone());
    }

    pub fn get_attendance(&self, email: &str) -> Option<AttendanceRecord> {
        self.tables
            .attendance
            .get(email)
            .map(|r| r.value().clone())
    }

    pub fn add_attendance(
        &self,
        email: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> AttendanceUpdate {
        let mut entry = self
            .tables
            .attendance
            .entry(email.to_string())
            .or_insert_with(|| AttendanceRecord::new(email, now));

        let update = AttendanceUpdate::apply(entry.value().clone(), session, now);
        if update.newly_added {
            *entry.value_mut() = update.record.clone();
        }
        update
    }

    pub fn get_badges(&self, email: &str) -> Option<BadgeRecord> {
        self.tables.badges.get(email).map(|r| r.value().clone())
    }

    pub fn grant_badges(
        &self,
        email: &str,
        candidates: &[String],
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut entry = self
            .tables
            .badges
            .entry(email.to_string())
            .or_insert_with(|| BadgeRecord::new(email, now));

        entry.value_mut().grant(candidates, now)
    }
}
