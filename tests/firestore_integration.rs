// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at the emulator.
//!
//! The emulator provides a clean state for each test run.

use checkin_badges::models::{SessionCategory, SessionCountThresholdRule};
use chrono::Utc;
use std::collections::HashSet;

mod common;
use common::{session, test_db};

/// Generate a unique email for test isolation.
fn unique_email(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.com", prefix, nanos)
}

// ═══════════════════════════════════════════════════════════════════════════
// USER & PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_get_or_create_user() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("user");

    assert!(db.get_user(&email).await.unwrap().is_none());

    let created = db.get_or_create_user(&email, Utc::now()).await.unwrap();
    let again = db.get_or_create_user(&email, Utc::now()).await.unwrap();

    assert_eq!(created.email, email);
    assert_eq!(created.created_at, again.created_at);
}

#[tokio::test]
async fn test_concurrent_profile_creation_agrees() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("profile");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            db.get_or_create_profile(&email, Utc::now()).await.unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().id);
    }
    assert_eq!(ids.len(), 1, "All callers must observe the same UUID");

    let id = ids.into_iter().next().unwrap();
    let profile = db.get_profile(id).await.unwrap().unwrap();
    assert_eq!(profile.email, email);
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSION & RULE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_sessions_by_track() {
    require_emulator!();

    let db = test_db().await;
    let track = unique_email("track");
    let later = session("FS-LATE", &track, SessionCategory::Numbered, 60, 90);
    let earlier = session("FS-EARLY", &track, SessionCategory::Numbered, -30, 30);

    db.upsert_sessions(&[later, earlier]).await.unwrap();

    let sessions = db.sessions_for_track(&track).await.unwrap();
    let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["FS-EARLY", "FS-LATE"]);
}

#[tokio::test]
async fn test_threshold_rules_by_count() {
    require_emulator!();

    let db = test_db().await;
    db.upsert_threshold_rules(&[
        SessionCountThresholdRule {
            count: 4242,
            badge: "fs-marathon".to_string(),
        },
        SessionCountThresholdRule {
            count: 4243,
            badge: "fs-other".to_string(),
        },
    ])
    .await
    .unwrap();

    let rules = db.threshold_rules_for_count(4242).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].badge, "fs-marathon");
}

// ═══════════════════════════════════════════════════════════════════════════
// ATTENDANCE & BADGE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_attendance_is_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("attend");
    let numbered = session("FS-D1S1", "A", SessionCategory::Numbered, -10, 10);

    let first = db.add_attendance(&email, &numbered, Utc::now()).await.unwrap();
    assert!(first.newly_added);
    assert!(first.first_check_in);
    assert_eq!(first.record.numbered_sessions, 1);

    let second = db.add_attendance(&email, &numbered, Utc::now()).await.unwrap();
    assert!(!second.newly_added);
    assert!(!second.first_check_in);
    assert_eq!(second.record.numbered_sessions, 1);

    let stored = db.get_attendance(&email).await.unwrap().unwrap();
    assert_eq!(stored.total_sessions(), 1);
}

#[tokio::test]
async fn test_concurrent_check_ins_keep_count_consistent() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("race-attend");

    let mut handles = Vec::new();
    for i in 0..5 {
        let db = db.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("FS-RACE{}", i);
            let numbered = session(&id, "A", SessionCategory::Numbered, -10, 10);
            db.add_attendance(&email, &numbered, Utc::now()).await
        }));
    }

    // A check-in that exhausts its retries writes nothing
    let mut committed = 0;
    let mut firsts = 0;
    for handle in handles {
        if let Ok(update) = handle.await.unwrap() {
            committed += 1;
            if update.first_check_in {
                firsts += 1;
            }
        }
    }
    assert!(committed >= 1);
    assert_eq!(firsts, 1, "Exactly one check-in may create the record");

    let record = db.get_attendance(&email).await.unwrap().unwrap();
    assert_eq!(record.total_sessions(), committed);
    assert_eq!(record.numbered_sessions, committed);
}

#[tokio::test]
async fn test_grant_badge_twice() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("badge");
    let badges = vec!["newperson".to_string()];

    let first = db.grant_badges(&email, &badges, Utc::now()).await.unwrap();
    let second = db.grant_badges(&email, &badges, Utc::now()).await.unwrap();

    assert_eq!(first, badges);
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_concurrent_grants_award_once() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email("race");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let db = db.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            db.grant_badges(&email, &["session5".to_string()], Utc::now())
                .await
        }));
    }

    // Losers of the race either see the badge already held or exhaust
    // their retries; neither may grant it a second time.
    let mut granted = 0;
    for handle in handles {
        if let Ok(newly) = handle.await.unwrap() {
            granted += newly.len();
        }
    }
    assert_eq!(granted, 1);

    let record = db.get_badges(&email).await.unwrap().unwrap();
    assert_eq!(record.badges.len(), 1);
}
