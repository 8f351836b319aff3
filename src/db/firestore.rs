// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and public profiles
//! - Sessions and threshold rules (seeded at startup)
//! - Attendance and badge records (atomic set inserts)

use crate::db::{collections, AttendanceUpdate};
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, BadgeRecord, PublicProfile, Session, SessionCountThresholdRule, User,
};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use std::future::Future;
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 50;
/// Attempts before giving up on a contended transaction.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Document IDs are keyed by email or session ID; escape anything that
/// would be read as a path separator.
fn doc_id(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Repeat a transactional read-modify-write until it commits.
    ///
    /// `attempt` returns `Ok(None)` when the commit lost a race; the whole
    /// attempt (including its reads) is then repeated.
    async fn retry_transaction<T, F, Fut>(
        &self,
        op: &'static str,
        mut attempt: F,
    ) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, AppError>>,
    {
        for attempt_no in 1..=MAX_TRANSACTION_ATTEMPTS {
            if let Some(value) = attempt().await? {
                return Ok(value);
            }
            tracing::warn!(op, attempt = attempt_no, "Transaction conflict, retrying");
        }
        Err(AppError::Database(format!(
            "{} did not commit after {} attempts",
            op, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    /// Client whose reads are bound to `transaction`, so a concurrent write
    /// to any document read through it makes the commit fail.
    fn transactional_reader(
        &self,
        transaction: &firestore::FirestoreTransaction<'_>,
    ) -> firestore::FirestoreDb {
        self.client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        )
    }

    async fn begin(&self) -> Result<firestore::FirestoreTransaction<'_>, AppError> {
        self.client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Commit, mapping a failed commit to "retry".
    async fn commit(transaction: firestore::FirestoreTransaction<'_>, op: &'static str) -> bool {
        match transaction.commit().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(op, error = %e, "Transaction commit failed");
                false
            }
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by normalized email.
    pub async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_or_create_user(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        self.retry_transaction("get_or_create_user", move || {
            self.try_get_or_create_user(email, now)
        })
        .await
    }

    async fn try_get_or_create_user(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let mut transaction = self.begin().await?;
        let existing: Option<User> = self
            .transactional_reader(&transaction)
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(user) = existing {
            let _ = transaction.rollback().await;
            return Ok(Some(user));
        }

        let user = User::new(email, now);
        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(doc_id(email))
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        if Self::commit(transaction, "get_or_create_user").await {
            tracing::info!(email, "Created user");
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    // ─── Public Profile Operations ───────────────────────────────

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<PublicProfile>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get or atomically create the profile for an email.
    ///
    /// The email-keyed document is the one read inside the transaction, so
    /// two racing creators conflict on it and the loser re-reads the winner's
    /// UUID.
    pub async fn get_or_create_profile(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<PublicProfile, AppError> {
        self.retry_transaction("get_or_create_profile", move || {
            self.try_get_or_create_profile(email, now)
        })
        .await
    }

    async fn try_get_or_create_profile(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PublicProfile>, AppError> {
        let mut transaction = self.begin().await?;
        let existing: Option<PublicProfile> = self
            .transactional_reader(&transaction)
            .fluent()
            .select()
            .by_id_in(collections::PROFILE_EMAILS)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(profile) = existing {
            let _ = transaction.rollback().await;
            return Ok(Some(profile));
        }

        let profile = PublicProfile::generate(email, now);
        for (collection, id) in [
            (collections::PROFILE_EMAILS, doc_id(email)),
            (collections::PROFILES, profile.id.to_string()),
        ] {
            self.client
                .fluent()
                .update()
                .in_col(collection)
                .document_id(&id)
                .object(&profile)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add profile to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        if Self::commit(transaction, "get_or_create_profile").await {
            tracing::info!(email, uuid = %profile.id, "Created public profile");
            Ok(Some(profile))
        } else {
            Ok(None)
        }
    }

    // ─── Session Operations ──────────────────────────────────────

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(doc_id(session_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All sessions on a track. Time-window filtering happens in the caller;
    /// a track holds a few dozen sessions at most.
    pub async fn sessions_for_track(&self, track: &str) -> Result<Vec<Session>, AppError> {
        let track = track.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.field("track").eq(track.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store multiple sessions.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_upsert_sessions(&self, sessions: &[Session]) -> Result<(), AppError> {
        let client = &self.client;

        stream::iter(sessions.to_vec())
            .map(|session| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::SESSIONS)
                    .document_id(doc_id(&session.session_id))
                    .object(&session)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Threshold Rule Operations ───────────────────────────────

    pub async fn threshold_rules_for_count(
        &self,
        count: u32,
    ) -> Result<Vec<SessionCountThresholdRule>, AppError> {
        let count = u64::from(count);
        self.client
            .fluent()
            .select()
            .from(collections::THRESHOLD_RULES)
            .filter(move |q| q.field("count").eq(count))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn batch_upsert_threshold_rules(
        &self,
        rules: &[SessionCountThresholdRule],
    ) -> Result<(), AppError> {
        let client = &self.client;

        stream::iter(rules.to_vec())
            .map(|rule| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::THRESHOLD_RULES)
                    .document_id(doc_id(&rule.document_id()))
                    .object(&rule)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Attendance Operations ───────────────────────────────────

    pub async fn get_attendance(&self, email: &str) -> Result<Option<AttendanceRecord>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::ATTENDANCE)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically add a session to a user's attendance set.
    ///
    /// Re-adding a present session rolls back without writing.
    pub async fn add_attendance(
        &self,
        email: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<AttendanceUpdate, AppError> {
        self.retry_transaction("add_attendance", move || {
            self.try_add_attendance(email, session, now)
        })
        .await
    }

    async fn try_add_attendance(
        &self,
        email: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Option<AttendanceUpdate>, AppError> {
        let mut transaction = self.begin().await?;
        let current: Option<AttendanceRecord> = self
            .transactional_reader(&transaction)
            .fluent()
            .select()
            .by_id_in(collections::ATTENDANCE)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read attendance in transaction: {}", e))
            })?;

        let record = current.unwrap_or_else(|| AttendanceRecord::new(email, now));
        let update = AttendanceUpdate::apply(record, session, now);

        if !update.newly_added {
            tracing::debug!(
                email,
                session_id = %session.session_id,
                "Session already recorded (idempotent skip)"
            );
            let _ = transaction.rollback().await;
            return Ok(Some(update));
        }

        self.client
            .fluent()
            .update()
            .in_col(collections::ATTENDANCE)
            .document_id(doc_id(email))
            .object(&update.record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add attendance to transaction: {}", e))
            })?;

        Ok(Self::commit(transaction, "add_attendance")
            .await
            .then_some(update))
    }

    // ─── Badge Operations ────────────────────────────────────────

    pub async fn get_badges(&self, email: &str) -> Result<Option<BadgeRecord>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::BADGES)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically insert badges into a user's badge set.
    ///
    /// Returns only the badges that were newly inserted. If none are new the
    /// transaction is rolled back without writing.
    pub async fn grant_badges(
        &self,
        email: &str,
        candidates: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        self.retry_transaction("grant_badges", move || {
            self.try_grant_badges(email, candidates, now)
        })
        .await
    }

    async fn try_grant_badges(
        &self,
        email: &str,
        candidates: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<String>>, AppError> {
        let mut transaction = self.begin().await?;
        let current: Option<BadgeRecord> = self
            .transactional_reader(&transaction)
            .fluent()
            .select()
            .by_id_in(collections::BADGES)
            .obj()
            .one(doc_id(email))
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read badges in transaction: {}", e))
            })?;

        let mut record = current.unwrap_or_else(|| BadgeRecord::new(email, now));
        let granted = record.grant(candidates, now);

        if granted.is_empty() {
            let _ = transaction.rollback().await;
            return Ok(Some(granted));
        }

        self.client
            .fluent()
            .update()
            .in_col(collections::BADGES)
            .document_id(doc_id(email))
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add badges to transaction: {}", e))
            })?;

        Ok(Self::commit(transaction, "grant_badges")
            .await
            .then_some(granted))
    }
}
