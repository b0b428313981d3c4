// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission oracle contract.
//!
//! The oracle is the remote authority for role and ownership predicates.
//! Every check is a round trip that can fail; the typed
//! `Result<bool, OracleError>` contract keeps the "degrade to false on
//! error" policy out of the oracle itself. That policy is applied in exactly
//! one place, the [`RoleResolver`](crate::resolver::RoleResolver) boundary.
//!
//! [`PermissionOracle`] carries the three predicates the resolver wraps.
//! [`AdminDirectory`] carries the coarser directory reads the navigation
//! guards use (admin membership, any-project ownership); those never go
//! through the cache.

use async_trait::async_trait;

use crate::types::{AdminRole, ProjectId, UserId};

/// Failure of a permission oracle round trip.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
	#[error("oracle backend error: {0}")]
	Backend(String),

	#[error("oracle unreachable: {0}")]
	Unreachable(String),
}

/// Remote role/ownership predicates.
///
/// `can_manage_project` is deliberately a single oracle-side predicate
/// ("global admin OR project owner") rather than a local composition of the
/// other two, so the OR is evaluated against one consistent snapshot of the
/// backing records.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
	/// Is this user a global administrator?
	async fn is_global_admin(&self, user_id: UserId) -> Result<bool, OracleError>;

	/// Is this user listed as an owner of the given project?
	async fn is_project_owner(
		&self,
		user_id: UserId,
		project_id: ProjectId,
	) -> Result<bool, OracleError>;

	/// May this user manage the given project (global admin or owner)?
	async fn can_manage_project(
		&self,
		user_id: UserId,
		project_id: ProjectId,
	) -> Result<bool, OracleError>;
}

/// Directory reads used by navigation guards.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
	/// The user's admin-directory role, if they have one.
	async fn admin_membership(&self, user_id: UserId) -> Result<Option<AdminRole>, OracleError>;

	/// Is this user listed in the owner list of any project?
	async fn owns_any_project(&self, user_id: UserId) -> Result<bool, OracleError>;
}
