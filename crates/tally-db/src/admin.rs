// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin directory repository.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{AdminRole, UserId};

use crate::error::DbError;
use crate::types::AdminRecord;

/// Repository for the `admins` table.
#[derive(Clone)]
pub struct AdminRepository {
	pool: SqlitePool,
}

impl AdminRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Grant an admin role, replacing any existing role for the user.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, role = %role))]
	pub async fn grant(&self, user_id: UserId, role: AdminRole) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO admins (id, role, created_at)
			VALUES (?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET role = excluded.role
			"#,
		)
		.bind(user_id.to_string())
		.bind(role.to_string())
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user_id, role = %role, "admin role granted");
		Ok(())
	}

	/// Remove a user from the admin directory.
	///
	/// Returns `true` if a row was deleted.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn revoke(&self, user_id: UserId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM admins WHERE id = ?")
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Fetch a user's admin record, if any.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn get(&self, user_id: UserId) -> Result<Option<AdminRecord>, DbError> {
		let row = sqlx::query("SELECT id, role, created_at FROM admins WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(row_to_record).transpose()
	}

	/// List all admin records.
	#[tracing::instrument(skip(self))]
	pub async fn list(&self) -> Result<Vec<AdminRecord>, DbError> {
		let rows = sqlx::query("SELECT id, role, created_at FROM admins ORDER BY created_at")
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(row_to_record).collect()
	}
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<AdminRecord, DbError> {
	let id: String = row.try_get("id")?;
	let role: String = row.try_get("role")?;
	let created_at: String = row.try_get("created_at")?;

	Ok(AdminRecord {
		id: parse_user_id(&id)?,
		role: AdminRole::parse(&role)
			.ok_or_else(|| DbError::Internal(format!("unknown admin role: {role}")))?,
		created_at: parse_timestamp(&created_at)?,
	})
}

pub(crate) fn parse_user_id(s: &str) -> Result<UserId, DbError> {
	s.parse::<uuid::Uuid>()
		.map(UserId::new)
		.map_err(|e| DbError::Internal(format!("invalid user id {s}: {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp {s}: {e}")))
}
