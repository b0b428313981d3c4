// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access token store.
//!
//! Only SHA-256 hashes are persisted; verification hashes the presented
//! bearer value and looks the hash up.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use tally_auth::token::{generate_access_token, hash_access_token, is_access_token};
use tally_auth::UserId;

use crate::admin::parse_user_id;
use crate::error::DbError;

/// Repository for the `access_tokens` table.
#[derive(Clone)]
pub struct AccessTokenRepository {
	pool: SqlitePool,
}

impl AccessTokenRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Issue a new token for a user.
	///
	/// The raw token is returned exactly once; only its hash is stored.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn issue(&self, user_id: UserId) -> Result<String, DbError> {
		let token = generate_access_token();
		sqlx::query("INSERT INTO access_tokens (token_hash, user_id, created_at) VALUES (?, ?, ?)")
			.bind(hash_access_token(&token))
			.bind(user_id.to_string())
			.bind(Utc::now().to_rfc3339())
			.execute(&self.pool)
			.await?;

		tracing::debug!(user_id = %user_id, "access token issued");
		Ok(token)
	}

	/// Resolve a presented bearer value to its user, updating last use.
	///
	/// Returns `None` for unknown tokens and for values that do not carry
	/// the access-token prefix.
	#[tracing::instrument(skip(self, token))]
	pub async fn verify(&self, token: &str) -> Result<Option<UserId>, DbError> {
		if !is_access_token(token) {
			return Ok(None);
		}

		let hash = hash_access_token(token);
		let user_id: Option<String> = sqlx::query_scalar(
			"UPDATE access_tokens SET last_used_at = ? WHERE token_hash = ? RETURNING user_id",
		)
		.bind(Utc::now().to_rfc3339())
		.bind(hash)
		.fetch_optional(&self.pool)
		.await?;

		user_id.as_deref().map(parse_user_id).transpose()
	}

	/// Revoke all tokens for a user.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn revoke_for_user(&self, user_id: UserId) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM access_tokens WHERE user_id = ?")
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}
