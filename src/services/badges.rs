// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge rule engine.
//!
//! Rules run after every check-in, in this order:
//! 1. First-ever check-in grants `newperson` and stops evaluation.
//! 2. Numbered-session milestones (1, 5, 10, 20, all 27).
//! 3. Stack tag and conferred badge of the session just attended.
//! 4. Data-driven threshold rules on the total attendance count.
//!
//! Candidates from all rules are granted with one atomic store call, so a
//! badge is never awarded twice to the same user.

use crate::db::{AttendanceUpdate, Db};
use crate::error::Result;
use crate::models::{Session, SessionCountThresholdRule, User};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Badge granted on a user's first check-in.
pub const NEWPERSON_BADGE: &str = "newperson";

/// Numbered-session count -> badge.
pub const SESSION_MILESTONES: &[(u32, &str)] = &[
    (1, "session1"),
    (5, "session5"),
    (10, "session10"),
    (20, "session20"),
    (27, "sessionAll"),
];

/// Which rule families to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Rules 1-3; used by the email-based attendance endpoint.
    Legacy,
    /// Rules 1-4; used by authenticated track check-ins.
    Full,
}

/// Badges newly granted by one check-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct BadgeOutcome {
    pub granted: Vec<String>,
}

impl BadgeOutcome {
    /// Whether any badge was newly granted.
    pub fn badge_earned(&self) -> bool {
        !self.granted.is_empty()
    }
}

/// Milestone badge for an exact numbered-session count.
pub fn milestone_badge(numbered_sessions: u32) -> Option<&'static str> {
    SESSION_MILESTONES
        .iter()
        .find(|(count, _)| *count == numbered_sessions)
        .map(|(_, badge)| *badge)
}

/// Candidate badges for a check-in, before deduplication against the
/// user's existing badges.
///
/// `thresholds` must already be filtered to the user's total attendance
/// count; it is ignored for [`RuleSet::Legacy`].
pub fn candidate_badges(
    update: &AttendanceUpdate,
    session: &Session,
    rule_set: RuleSet,
    thresholds: &[SessionCountThresholdRule],
) -> Vec<String> {
    if update.is_registration() {
        return vec![NEWPERSON_BADGE.to_string()];
    }

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |badge: &str| {
        if !candidates.iter().any(|c| c == badge) {
            candidates.push(badge.to_string());
        }
    };

    if let Some(badge) = milestone_badge(update.record.numbered_sessions) {
        push(badge);
    }

    if let Some(stack) = session.stack_tag() {
        push(stack);
    }
    if let Some(badge) = session.conferred_badge() {
        push(badge);
    }

    if rule_set == RuleSet::Full {
        let total = update.record.total_sessions();
        for rule in thresholds.iter().filter(|r| r.count == total) {
            push(&rule.badge);
        }
    }

    candidates
}

/// Evaluates badge rules and grants badges.
#[derive(Clone)]
pub struct BadgeEngine {
    db: Db,
}

impl BadgeEngine {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Grant a single badge.
    ///
    /// Returns `false` if the user already held it.
    pub async fn grant_badge(&self, user: &User, badge: &str) -> Result<bool> {
        let granted = self.grant_badges(user, &[badge.to_string()]).await?;
        Ok(!granted.is_empty())
    }

    /// Grant several badges in one atomic operation.
    ///
    /// Returns the badges the user did not already hold.
    pub async fn grant_badges(&self, user: &User, badges: &[String]) -> Result<Vec<String>> {
        let granted = self
            .db
            .grant_badges(&user.email, badges, chrono::Utc::now())
            .await?;

        if !granted.is_empty() {
            tracing::info!(email = %user.email, badges = ?granted, "Badges granted");
        }
        Ok(granted)
    }

    /// Evaluate the rules for a check-in that has just been recorded.
    pub async fn evaluate(
        &self,
        user: &User,
        update: &AttendanceUpdate,
        session: &Session,
        rule_set: RuleSet,
    ) -> Result<BadgeOutcome> {
        let thresholds = if rule_set == RuleSet::Full && !update.is_registration() {
            self.db
                .threshold_rules_for_count(update.record.total_sessions())
                .await?
        } else {
            Vec::new()
        };

        let candidates = candidate_badges(update, session, rule_set, &thresholds);
        tracing::debug!(
            email = %user.email,
            session_id = %session.session_id,
            numbered = update.record.numbered_sessions,
            total = update.record.total_sessions(),
            candidates = ?candidates,
            "Evaluated badge rules"
        );

        let granted = self.grant_badges(user, &candidates).await?;
        Ok(BadgeOutcome { granted })
    }
}
