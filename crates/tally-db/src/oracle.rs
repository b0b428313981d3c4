// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed permission oracle.
//!
//! [`SqliteOracle`] is the concrete authority behind the role resolver's
//! predicates. Each check is one query against the persisted records; the
//! admin-OR-owner predicate is a single statement so both facts come from
//! one consistent snapshot.
//!
//! Errors surface as [`OracleError`]; the degrade-to-false policy lives in
//! the resolver, not here.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{AdminDirectory, AdminRole, OracleError, PermissionOracle, ProjectId, UserId};

fn oracle_error(e: sqlx::Error) -> OracleError {
	OracleError::Backend(e.to_string())
}

/// Permission predicates evaluated against the SQLite records.
#[derive(Clone)]
pub struct SqliteOracle {
	pool: SqlitePool,
}

impl SqliteOracle {
	/// Create a new oracle over the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl PermissionOracle for SqliteOracle {
	#[tracing::instrument(level = "debug", skip(self), fields(user_id = %user_id))]
	async fn is_global_admin(&self, user_id: UserId) -> Result<bool, OracleError> {
		let exists: i64 = sqlx::query_scalar(
			"SELECT EXISTS(SELECT 1 FROM admins WHERE id = ? AND role = 'global_admin')",
		)
		.bind(user_id.to_string())
		.fetch_one(&self.pool)
		.await
		.map_err(oracle_error)?;

		Ok(exists != 0)
	}

	#[tracing::instrument(level = "debug", skip(self), fields(user_id = %user_id, project_id = %project_id))]
	async fn is_project_owner(
		&self,
		user_id: UserId,
		project_id: ProjectId,
	) -> Result<bool, OracleError> {
		let exists: i64 = sqlx::query_scalar(
			"SELECT EXISTS(SELECT 1 FROM project_admins WHERE project_id = ? AND user_id = ?)",
		)
		.bind(project_id.to_string())
		.bind(user_id.to_string())
		.fetch_one(&self.pool)
		.await
		.map_err(oracle_error)?;

		Ok(exists != 0)
	}

	#[tracing::instrument(level = "debug", skip(self), fields(user_id = %user_id, project_id = %project_id))]
	async fn can_manage_project(
		&self,
		user_id: UserId,
		project_id: ProjectId,
	) -> Result<bool, OracleError> {
		// One statement for the OR: both facts come from the same snapshot.
		let allowed: i64 = sqlx::query_scalar(
			r#"
			SELECT EXISTS(SELECT 1 FROM admins WHERE id = ? AND role = 'global_admin')
			    OR EXISTS(SELECT 1 FROM project_admins WHERE user_id = ? AND project_id = ?)
			"#,
		)
		.bind(user_id.to_string())
		.bind(user_id.to_string())
		.bind(project_id.to_string())
		.fetch_one(&self.pool)
		.await
		.map_err(oracle_error)?;

		Ok(allowed != 0)
	}
}

#[async_trait]
impl AdminDirectory for SqliteOracle {
	#[tracing::instrument(level = "debug", skip(self), fields(user_id = %user_id))]
	async fn admin_membership(&self, user_id: UserId) -> Result<Option<AdminRole>, OracleError> {
		let row = sqlx::query("SELECT role FROM admins WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await
			.map_err(oracle_error)?;

		match row {
			Some(row) => {
				let role: String = row.try_get("role").map_err(oracle_error)?;
				AdminRole::parse(&role)
					.map(Some)
					.ok_or_else(|| OracleError::Backend(format!("unknown admin role: {role}")))
			}
			None => Ok(None),
		}
	}

	#[tracing::instrument(level = "debug", skip(self), fields(user_id = %user_id))]
	async fn owns_any_project(&self, user_id: UserId) -> Result<bool, OracleError> {
		let exists: i64 =
			sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM project_admins WHERE user_id = ?)")
				.bind(user_id.to_string())
				.fetch_one(&self.pool)
				.await
				.map_err(oracle_error)?;

		Ok(exists != 0)
	}
}
