// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for identity and authorization.
//!
//! This module defines the foundational types used throughout the role
//! system:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`UserId`],
//!   [`ProjectId`], etc.) preventing accidental mixing
//! - **[`AdminRole`]**: the two elevated roles Tally knows about, global
//!   administrators (manage every project) and project owners (manage only
//!   the projects that list them)
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(ProjectId, "Unique identifier for a project.");
define_id_type!(CommissionId, "Unique identifier for a commission record.");
define_id_type!(JoinRequestId, "Unique identifier for a join request.");

// =============================================================================
// Admin Roles
// =============================================================================

/// Elevated roles recorded in the admin directory.
///
/// Membership in the directory alone does not decide project-level access;
/// the [`PermissionOracle`](crate::oracle::PermissionOracle) is the single
/// source of truth for "can this user manage this project".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
	/// Unconditional management rights over every project.
	GlobalAdmin,
	/// Rights scoped to the projects whose owner list includes the user.
	ProjectOwner,
}

impl AdminRole {
	/// Returns all available admin roles.
	pub fn all() -> &'static [AdminRole] {
		&[AdminRole::GlobalAdmin, AdminRole::ProjectOwner]
	}

	/// Parse a role from its persisted string form.
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"global_admin" => Some(AdminRole::GlobalAdmin),
			"project_owner" => Some(AdminRole::ProjectOwner),
			_ => None,
		}
	}
}

impl fmt::Display for AdminRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AdminRole::GlobalAdmin => write!(f, "global_admin"),
			AdminRole::ProjectOwner => write!(f, "project_owner"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_id_display_is_uuid() {
		let uuid = Uuid::new_v4();
		let id = UserId::new(uuid);
		assert_eq!(id.to_string(), uuid.to_string());
	}

	#[test]
	fn ids_serialize_transparently() {
		let id = ProjectId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
	}

	#[test]
	fn admin_role_round_trips_through_display() {
		for role in AdminRole::all() {
			assert_eq!(AdminRole::parse(&role.to_string()), Some(*role));
		}
	}

	#[test]
	fn admin_role_parse_rejects_unknown() {
		assert_eq!(AdminRole::parse("superuser"), None);
		assert_eq!(AdminRole::parse(""), None);
	}
}
