// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route metadata and guard outcomes.

/// Where guards redirect unauthenticated visitors.
pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// Landing page for regular (non-admin) users.
pub const COMMISSIONS_ROUTE: &str = "/commissions";

/// Landing page for global administrators.
pub const ADMIN_PROJECTS_ROUTE: &str = "/admin/projects";

/// Landing page for project owners who are not global admins.
pub const MY_PROJECTS_ROUTE: &str = "/admin/projects/my-projects";

/// Commission overview for admin-directory members.
pub const ADMIN_COMMISSIONS_ROUTE: &str = "/admin/commissions";

/// The navigation target a guard evaluates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
	/// Route path, for logging only. Guards never parse it.
	pub path: &'static str,
	/// Public routes skip the entry guard entirely.
	pub public: bool,
}

impl RouteMeta {
	pub const fn public(path: &'static str) -> Self {
		Self { path, public: true }
	}

	pub const fn protected(path: &'static str) -> Self {
		Self {
			path,
			public: false,
		}
	}
}

/// Verdict of a navigation guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
	/// Let the navigation proceed.
	Allow,
	/// Send the visitor elsewhere.
	Redirect(&'static str),
}

impl GuardOutcome {
	pub fn is_allow(self) -> bool {
		matches!(self, GuardOutcome::Allow)
	}
}
