// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod records;
pub mod session;
pub mod user;

pub use records::{AttendanceRecord, BadgeRecord};
pub use session::{Session, SessionCategory, SessionCountThresholdRule};
pub use user::{PublicProfile, User};
