// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod attendance;
pub mod badges;
pub mod identity;
pub mod public_profile;
pub mod seed;

pub use attendance::AttendanceRecorder;
pub use badges::{BadgeEngine, BadgeOutcome, RuleSet};
pub use identity::IdentityResolver;
pub use public_profile::PublicProfileProjector;
pub use seed::{SeedData, SeedError};
