// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User profile repository.
//!
//! Covers the privileged admin-endpoint operations: profile creation
//! (idempotent), invitation, and full user deletion with cascade to every
//! dependent record.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{AdminRole, UserId};

use crate::admin::{parse_timestamp, parse_user_id};
use crate::error::DbError;
use crate::types::UserProfile;

/// Repository for the `profiles` table and user lifecycle.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch a profile by user ID.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, DbError> {
		let row = sqlx::query("SELECT id, email, name, created_at FROM profiles WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(row_to_profile).transpose()
	}

	/// Fetch a profile by email.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, DbError> {
		let row = sqlx::query("SELECT id, email, name, created_at FROM profiles WHERE email = ?")
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		row.map(row_to_profile).transpose()
	}

	/// Create a profile for the given identity if none exists.
	///
	/// Idempotent: returns the existing profile and `false` when one is
	/// already present.
	#[tracing::instrument(skip(self, email, name), fields(user_id = %user_id))]
	pub async fn create_profile_if_missing(
		&self,
		user_id: UserId,
		email: &str,
		name: Option<&str>,
	) -> Result<(UserProfile, bool), DbError> {
		if let Some(existing) = self.get_profile(user_id).await? {
			return Ok((existing, false));
		}

		let profile = UserProfile {
			id: user_id,
			email: email.to_string(),
			name: name.map(str::to_string),
			created_at: Utc::now(),
		};

		sqlx::query("INSERT INTO profiles (id, email, name, created_at) VALUES (?, ?, ?, ?)")
			.bind(profile.id.to_string())
			.bind(&profile.email)
			.bind(profile.name.as_deref())
			.bind(profile.created_at.to_rfc3339())
			.execute(&self.pool)
			.await
			.map_err(|e| match e {
				sqlx::Error::Database(ref db) if db.is_unique_violation() => {
					DbError::Conflict(format!("profile email already in use: {email}"))
				}
				other => DbError::Sqlx(other),
			})?;

		tracing::info!(user_id = %user_id, "profile created");
		Ok((profile, true))
	}

	/// Invite a user by email: create their profile and, when requested, an
	/// admin-directory entry, in one transaction.
	///
	/// Returns the new user's ID, or `DbError::Conflict` if the email is
	/// already registered.
	#[tracing::instrument(skip(self, email, name))]
	pub async fn invite(
		&self,
		email: &str,
		name: Option<&str>,
		make_admin: bool,
	) -> Result<UserId, DbError> {
		if self.get_profile_by_email(email).await?.is_some() {
			return Err(DbError::Conflict(format!("email already invited: {email}")));
		}

		let user_id = UserId::generate();
		let now = Utc::now().to_rfc3339();

		let mut tx = self.pool.begin().await?;

		sqlx::query("INSERT INTO profiles (id, email, name, created_at) VALUES (?, ?, ?, ?)")
			.bind(user_id.to_string())
			.bind(email)
			.bind(name)
			.bind(&now)
			.execute(&mut *tx)
			.await?;

		if make_admin {
			sqlx::query("INSERT INTO admins (id, role, created_at) VALUES (?, ?, ?)")
				.bind(user_id.to_string())
				.bind(AdminRole::GlobalAdmin.to_string())
				.bind(&now)
				.execute(&mut *tx)
				.await?;
		}

		tx.commit().await?;

		tracing::info!(user_id = %user_id, make_admin, "user invited");
		Ok(user_id)
	}

	/// Delete a user and every dependent record in one transaction.
	///
	/// Returns `false` if no profile existed for the user.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn delete_user(&self, user_id: UserId) -> Result<bool, DbError> {
		let id = user_id.to_string();
		let mut tx = self.pool.begin().await?;

		let deleted = sqlx::query("DELETE FROM profiles WHERE id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?
			.rows_affected() > 0;

		sqlx::query("DELETE FROM admins WHERE id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM project_admins WHERE user_id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM project_users WHERE user_id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM commissions WHERE user_id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM join_requests WHERE user_id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM access_tokens WHERE user_id = ?")
			.bind(&id)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		if deleted {
			tracing::info!(user_id = %user_id, "user deleted with cascade");
		}
		Ok(deleted)
	}
}

fn row_to_profile(row: sqlx::sqlite::SqliteRow) -> Result<UserProfile, DbError> {
	let id: String = row.try_get("id")?;
	let email: String = row.try_get("email")?;
	let name: Option<String> = row.try_get("name")?;
	let created_at: String = row.try_get("created_at")?;

	Ok(UserProfile {
		id: parse_user_id(&id)?,
		email,
		name,
		created_at: parse_timestamp(&created_at)?,
	})
}
