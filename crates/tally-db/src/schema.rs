// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database schema creation.
//!
//! All timestamps are RFC 3339 strings; all IDs are UUID strings.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// Create all tables if they do not exist.
#[tracing::instrument(skip(pool))]
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS profiles (
			id TEXT PRIMARY KEY,
			email TEXT NOT NULL UNIQUE,
			name TEXT,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS admins (
			id TEXT PRIMARY KEY,
			role TEXT NOT NULL CHECK (role IN ('global_admin', 'project_owner')),
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS projects (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS project_admins (
			project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
			user_id TEXT NOT NULL,
			PRIMARY KEY (project_id, user_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS project_users (
			project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
			user_id TEXT NOT NULL,
			ref_percentage REAL NOT NULL DEFAULT 0,
			joined_at TEXT NOT NULL,
			PRIMARY KEY (project_id, user_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS commissions (
			id TEXT PRIMARY KEY,
			user_id TEXT NOT NULL,
			project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
			client_name TEXT,
			description TEXT NOT NULL,
			date TEXT NOT NULL,
			status TEXT NOT NULL CHECK (status IN ('requested', 'confirmed', 'paid')),
			value REAL NOT NULL,
			currency TEXT NOT NULL DEFAULT 'USD'
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_commissions_project_date ON commissions(project_id, date)")
		.execute(pool)
		.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS join_requests (
			id TEXT PRIMARY KEY,
			user_id TEXT NOT NULL,
			project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
			message TEXT,
			ref_percentage REAL,
			status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
			created_at TEXT NOT NULL,
			updated_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS access_tokens (
			token_hash TEXT PRIMARY KEY,
			user_id TEXT NOT NULL,
			created_at TEXT NOT NULL,
			last_used_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("schema applied");
	Ok(())
}
