// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Db`] fronts two backends with identical semantics: Firestore for
//! deployments and an in-process store for local development and tests.
//! Every "create if absent" and "add to set" operation is atomic in both.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, BadgeRecord, PublicProfile, Session, SessionCountThresholdRule, User,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Public profiles keyed by UUID
    pub const PROFILES: &str = "profiles";
    /// Public profiles keyed by email (reverse index for lazy creation)
    pub const PROFILE_EMAILS: &str = "profile_emails";
    pub const SESSIONS: &str = "sessions";
    pub const ATTENDANCE: &str = "attendance";
    pub const BADGES: &str = "badges";
    pub const THRESHOLD_RULES: &str = "threshold_rules";
}

/// Result of atomically adding a session to a user's attendance record.
#[derive(Debug, Clone)]
pub struct AttendanceUpdate {
    /// Record state after the write
    pub record: AttendanceRecord,
    /// The session was not already in the set
    pub newly_added: bool,
    /// The set was empty before this write
    pub first_check_in: bool,
}

impl AttendanceUpdate {
    pub(crate) fn apply(
        mut record: AttendanceRecord,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Self {
        let was_empty = record.sessions.is_empty();
        let newly_added = record.add_session(session, now);
        Self {
            record,
            newly_added,
            first_check_in: was_empty && newly_added,
        }
    }

    /// The record holds exactly one session.
    ///
    /// Derived from stored state, so a repeated or retried first check-in
    /// evaluates the same way as the original one.
    pub fn is_registration(&self) -> bool {
        self.record.total_sessions() == 1
    }
}

/// Storage handle shared by all services.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Db {
    /// Connect to the backend selected in the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Firestore => {
                Ok(Db::Firestore(FirestoreDb::new(&config.gcp_project_id).await?))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                Ok(Db::in_memory())
            }
        }
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Db::Memory(MemoryDb::new())
    }

    // ─── Users & Profiles ────────────────────────────────────────

    pub async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.get_user(email).await,
            Db::Memory(db) => Ok(db.get_user(email)),
        }
    }

    /// Return the user, creating it atomically if absent.
    pub async fn get_or_create_user(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        match self {
            Db::Firestore(db) => db.get_or_create_user(email, now).await,
            Db::Memory(db) => Ok(db.get_or_create_user(email, now)),
        }
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<PublicProfile>, AppError> {
        match self {
            Db::Firestore(db) => db.get_profile(id).await,
            Db::Memory(db) => Ok(db.get_profile(id)),
        }
    }

    /// Return the user's public profile, creating it atomically if absent.
    ///
    /// Concurrent callers for the same email always observe the same UUID.
    pub async fn get_or_create_profile(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<PublicProfile, AppError> {
        match self {
            Db::Firestore(db) => db.get_or_create_profile(email, now).await,
            Db::Memory(db) => Ok(db.get_or_create_profile(email, now)),
        }
    }

    // ─── Sessions & Rules ────────────────────────────────────────

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        match self {
            Db::Firestore(db) => db.get_session(session_id).await,
            Db::Memory(db) => Ok(db.get_session(session_id)),
        }
    }

    /// All sessions scheduled on a track, ordered by start time.
    pub async fn sessions_for_track(&self, track: &str) -> Result<Vec<Session>, AppError> {
        let mut sessions = match self {
            Db::Firestore(db) => db.sessions_for_track(track).await?,
            Db::Memory(db) => db.sessions_for_track(track),
        };
        sessions.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    pub async fn upsert_sessions(&self, sessions: &[Session]) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.batch_upsert_sessions(sessions).await,
            Db::Memory(db) => {
                sessions.iter().for_each(|s| db.upsert_session(s));
                Ok(())
            }
        }
    }

    /// Threshold rules whose count equals `count`, ordered by badge.
    pub async fn threshold_rules_for_count(
        &self,
        count: u32,
    ) -> Result<Vec<SessionCountThresholdRule>, AppError> {
        let mut rules = match self {
            Db::Firestore(db) => db.threshold_rules_for_count(count).await?,
            Db::Memory(db) => db.threshold_rules_for_count(count),
        };
        rules.sort_by(|a, b| a.badge.cmp(&b.badge));
        Ok(rules)
    }

    pub async fn upsert_threshold_rules(
        &self,
        rules: &[SessionCountThresholdRule],
    ) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.batch_upsert_threshold_rules(rules).await,
            Db::Memory(db) => {
                rules.iter().for_each(|r| db.upsert_threshold_rule(r));
                Ok(())
            }
        }
    }

    // ─── Attendance ──────────────────────────────────────────────

    pub async fn get_attendance(&self, email: &str) -> Result<Option<AttendanceRecord>, AppError> {
        match self {
            Db::Firestore(db) => db.get_attendance(email).await,
            Db::Memory(db) => Ok(db.get_attendance(email)),
        }
    }

    /// Atomically add a session to the user's attendance set, creating the
    /// record if absent.
    pub async fn add_attendance(
        &self,
        email: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<AttendanceUpdate, AppError> {
        match self {
            Db::Firestore(db) => db.add_attendance(email, session, now).await,
            Db::Memory(db) => Ok(db.add_attendance(email, session, now)),
        }
    }

    // ─── Badges ──────────────────────────────────────────────────

    pub async fn get_badges(&self, email: &str) -> Result<Option<BadgeRecord>, AppError> {
        match self {
            Db::Firestore(db) => db.get_badges(email).await,
            Db::Memory(db) => Ok(db.get_badges(email)),
        }
    }

    /// Atomically insert badges into the user's badge set.
    ///
    /// Returns the badges that were not already held, in candidate order.
    /// No record is created when `candidates` is empty.
    pub async fn grant_badges(
        &self,
        email: &str,
        candidates: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Db::Firestore(db) => db.grant_badges(email, candidates, now).await,
            Db::Memory(db) => Ok(db.grant_badges(email, candidates, now)),
        }
    }
}
