// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance recording and active-session lookup.

use crate::db::{AttendanceUpdate, Db};
use crate::error::{AppError, Result};
use crate::models::{Session, User};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct AttendanceRecorder {
    db: Db,
}

impl AttendanceRecorder {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Add `session` to the user's attendance set.
    ///
    /// Idempotent: checking into the same session again changes nothing and
    /// reports `newly_added = false`. The session is assumed to exist.
    pub async fn record_attendance(
        &self,
        user: &User,
        session: &Session,
    ) -> Result<AttendanceUpdate> {
        let update = self
            .db
            .add_attendance(&user.email, session, Utc::now())
            .await?;

        tracing::info!(
            email = %user.email,
            session_id = %session.session_id,
            newly_added = update.newly_added,
            first_check_in = update.first_check_in,
            total = update.record.total_sessions(),
            "Attendance recorded"
        );
        Ok(update)
    }

    /// Look up a session by ID.
    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.db
            .get_session(session_id.trim())
            .await?
            .ok_or_else(AppError::session_not_found)
    }

    /// The session running on `track` at `now`.
    ///
    /// When windows overlap, the one that started first wins.
    pub async fn active_session(&self, track: &str, now: DateTime<Utc>) -> Result<Session> {
        self.db
            .sessions_for_track(track)
            .await?
            .into_iter()
            .find(|s| s.is_active_at(now))
            .ok_or_else(|| AppError::NoActiveSession(track.to_string()))
    }

    /// Session IDs the user has attended (empty if none).
    pub async fn sessions_attended(&self, user: &User) -> Result<Vec<String>> {
        Ok(self
            .db
            .get_attendance(&user.email)
            .await?
            .map(|r| r.sessions.into_iter().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionCategory;
    use chrono::Duration;

    fn make_session(id: &str, track: &str, start: DateTime<Utc>, minutes: i64) -> Session {
        Session {
            session_id: id.to_string(),
            title: String::new(),
            track: track.to_string(),
            category: SessionCategory::Numbered,
            start,
            end: start + Duration::minutes(minutes),
            stack: None,
            badge: None,
        }
    }

    #[tokio::test]
    async fn test_active_session_by_window() {
        let db = Db::in_memory();
        let now = Utc::now();
        db.upsert_sessions(&[
            make_session("D1S1", "A", now - Duration::hours(2), 60),
            make_session("D1S2", "A", now - Duration::minutes(10), 60),
            make_session("D1S3", "B", now - Duration::minutes(10), 60),
        ])
        .await
        .unwrap();

        let recorder = AttendanceRecorder::new(db);
        let active = recorder.active_session("A", now).await.unwrap();
        assert_eq!(active.session_id, "D1S2");

        let err = recorder.active_session("C", now).await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveSession(track) if track == "C"));
    }

    #[tokio::test]
    async fn test_record_attendance_twice() {
        let db = Db::in_memory();
        let recorder = AttendanceRecorder::new(db);
        let user = User::new("a@example.com", Utc::now());
        let session = make_session("D1S1", "A", Utc::now(), 60);

        let first = recorder.record_attendance(&user, &session).await.unwrap();
        let second = recorder.record_attendance(&user, &session).await.unwrap();

        assert!(first.newly_added);
        assert!(!second.newly_added);
        assert_eq!(
            recorder.sessions_attended(&user).await.unwrap(),
            vec!["D1S1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let recorder = AttendanceRecorder::new(Db::in_memory());
        let err = recorder.session("D9S9").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "session does not exist"));
    }
}
