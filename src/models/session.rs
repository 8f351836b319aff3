// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conference session model and threshold rule table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of session, used to decide which attendances count toward
/// session milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    /// Regular numbered talk; counts toward milestones.
    Numbered,
    /// Registration desk, breaks, socials.
    Special,
    Keynote,
}

impl SessionCategory {
    pub fn counts_toward_milestones(self) -> bool {
        matches!(self, SessionCategory::Numbered)
    }
}

/// A scheduled session stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (also used as document ID), e.g. "D1S3"
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    /// Parallel track this slot belongs to
    pub track: String,
    pub category: SessionCategory,
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (inclusive)
    pub end: DateTime<Utc>,
    /// Topic tag; attending grants the badge of the same name
    #[serde(default)]
    pub stack: Option<String>,
    /// Badge conferred by attending this session
    #[serde(default)]
    pub badge: Option<String>,
}

impl Session {
    /// Whether `now` falls within the session's time window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }

    /// Non-empty stack tag, if any.
    pub fn stack_tag(&self) -> Option<&str> {
        non_empty(self.stack.as_deref())
    }

    /// Non-empty conferred badge, if any.
    pub fn conferred_badge(&self) -> Option<&str> {
        non_empty(self.badge.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Maps a total attendance count to a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCountThresholdRule {
    pub count: u32,
    pub badge: String,
}

impl SessionCountThresholdRule {
    /// Document ID; one rule per (count, badge) pair.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.count, self.badge)
    }
}
