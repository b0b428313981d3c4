// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Navigation guards for Tally.
//!
//! Every navigation passes the [`EntryGuard`] first (public routes
//! excepted), which holds briefly for session restoration before deciding.
//! Role guards ([`GuestGuard`], [`ProjectOwnerGuard`], [`UserOnlyGuard`])
//! then sort signed-in visitors onto role-appropriate pages. The
//! [`AuthReadiness`] gate covers the same restoration race at process
//! startup.

pub mod entry;
pub mod readiness;
pub mod roles;
pub mod route;
pub mod wait;

pub use entry::{EntryGuard, DEFAULT_RESTORE_DEADLINE};
pub use readiness::{AuthReadiness, DEFAULT_STARTUP_DEADLINE};
pub use roles::{GuestGuard, ProjectOwnerGuard, UserOnlyGuard};
pub use route::{GuardOutcome, RouteMeta};
pub use wait::{await_or_deadline, wait_for_settled};
