// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-scoped navigation guards.
//!
//! These run after the entry guard, so an identity is usually present; they
//! sort visitors onto the landing page their role calls for. Directory
//! lookups here go straight to the backend, never through the role cache:
//! a stale "admin" answer on a routing decision is worse than the extra
//! round trip.

use std::sync::Arc;

use tally_auth::{AdminDirectory, AdminRole, IdentitySource, PermissionOracle};

use crate::route::{
	GuardOutcome, ADMIN_COMMISSIONS_ROUTE, ADMIN_PROJECTS_ROUTE, COMMISSIONS_ROUTE,
	MY_PROJECTS_ROUTE, SIGN_IN_ROUTE,
};

/// Keeps signed-in users off guest-only pages (sign-in, landing).
///
/// Anonymous visitors pass; signed-in users are routed to the dashboard
/// matching their role.
pub struct GuestGuard {
	identity: IdentitySource,
	directory: Arc<dyn AdminDirectory>,
}

impl GuestGuard {
	pub fn new(identity: IdentitySource, directory: Arc<dyn AdminDirectory>) -> Self {
		Self {
			identity,
			directory,
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn evaluate(&self) -> GuardOutcome {
		let Some(user_id) = self.identity.current() else {
			return GuardOutcome::Allow;
		};

		match self.directory.admin_membership(user_id).await {
			Ok(Some(_)) => GuardOutcome::Redirect(ADMIN_PROJECTS_ROUTE),
			Ok(None) => GuardOutcome::Redirect(COMMISSIONS_ROUTE),
			Err(error) => {
				// An unreadable directory routes like a regular user.
				tracing::warn!(%error, "admin directory lookup failed in guest guard");
				GuardOutcome::Redirect(COMMISSIONS_ROUTE)
			}
		}
	}
}

/// Restricts a page to project owners.
///
/// Global admins are bounced to the full projects dashboard; directory
/// members who own nothing go to their (empty) project list; everyone
/// outside the directory goes back to commissions.
pub struct ProjectOwnerGuard {
	identity: IdentitySource,
	directory: Arc<dyn AdminDirectory>,
	oracle: Arc<dyn PermissionOracle>,
}

impl ProjectOwnerGuard {
	pub fn new(
		identity: IdentitySource,
		directory: Arc<dyn AdminDirectory>,
		oracle: Arc<dyn PermissionOracle>,
	) -> Self {
		Self {
			identity,
			directory,
			oracle,
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn evaluate(&self) -> GuardOutcome {
		let Some(user_id) = self.identity.current() else {
			return GuardOutcome::Redirect(SIGN_IN_ROUTE);
		};

		let membership = match self.directory.admin_membership(user_id).await {
			Ok(Some(role)) => role,
			Ok(None) => return GuardOutcome::Redirect(COMMISSIONS_ROUTE),
			Err(error) => {
				tracing::warn!(%error, "admin directory lookup failed in project owner guard");
				return GuardOutcome::Redirect(COMMISSIONS_ROUTE);
			}
		};

		// Global admins have their own dashboard; this page is not it.
		// The check goes to the oracle directly and degrades to false.
		let is_global_admin = self
			.oracle
			.is_global_admin(user_id)
			.await
			.unwrap_or_else(|error| {
				tracing::warn!(%error, "global admin check failed in project owner guard");
				false
			});
		if is_global_admin {
			return GuardOutcome::Redirect(ADMIN_PROJECTS_ROUTE);
		}

		// Ownership is structural (listed on some project) or declared
		// (directory role). Either suffices.
		let owns_structurally = self
			.directory
			.owns_any_project(user_id)
			.await
			.unwrap_or_else(|error| {
				tracing::warn!(%error, "ownership lookup failed in project owner guard");
				false
			});
		let is_owner = owns_structurally || membership == AdminRole::ProjectOwner;

		if is_owner {
			GuardOutcome::Allow
		} else {
			GuardOutcome::Redirect(MY_PROJECTS_ROUTE)
		}
	}
}

/// Restricts a page to regular users; admin-directory members are routed
/// to the admin commission overview instead.
pub struct UserOnlyGuard {
	identity: IdentitySource,
	directory: Arc<dyn AdminDirectory>,
}

impl UserOnlyGuard {
	pub fn new(identity: IdentitySource, directory: Arc<dyn AdminDirectory>) -> Self {
		Self {
			identity,
			directory,
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn evaluate(&self) -> GuardOutcome {
		let Some(user_id) = self.identity.current() else {
			return GuardOutcome::Redirect(SIGN_IN_ROUTE);
		};

		match self.directory.admin_membership(user_id).await {
			Ok(Some(_)) => GuardOutcome::Redirect(ADMIN_COMMISSIONS_ROUTE),
			// A failed lookup does not lock a regular user out of their
			// own commissions page.
			Ok(None) | Err(_) => GuardOutcome::Allow,
		}
	}
}
