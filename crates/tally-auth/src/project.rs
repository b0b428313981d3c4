// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project record as seen by the authorization layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, UserId};

/// A project and its member/owner lists.
///
/// The `admins` list is the structural owner list consulted by
/// [`can_manage_sync`](crate::fallback::can_manage_sync); the oracle remains
/// authoritative for actual management rights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
	pub id: ProjectId,
	pub name: String,
	/// Users listed as owners of this project.
	pub admins: Vec<UserId>,
	/// Users who have joined this project.
	pub users: Vec<UserId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Project {
	/// Create an empty project owned by nobody.
	pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id,
			name: name.into(),
			admins: Vec::new(),
			users: Vec::new(),
			created_at: now,
			updated_at: now,
		}
	}

	/// Is the user in this project's structural owner list?
	pub fn lists_owner(&self, user_id: UserId) -> bool {
		self.admins.contains(&user_id)
	}

	/// Has the user joined this project?
	pub fn lists_member(&self, user_id: UserId) -> bool {
		self.users.contains(&user_id)
	}
}
