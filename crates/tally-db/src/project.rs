// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project repository: projects, their owner and member lists.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{Project, ProjectId, UserId};

use crate::admin::{parse_timestamp, parse_user_id};
use crate::error::DbError;

/// Join metadata for a project member.
#[derive(Debug, Clone)]
pub struct MemberInfo {
	pub user_id: UserId,
	pub ref_percentage: f64,
	pub joined_at: chrono::DateTime<Utc>,
}

/// Repository for projects and their owner/member lists.
#[derive(Clone)]
pub struct ProjectRepository {
	pool: SqlitePool,
}

impl ProjectRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a project.
	#[tracing::instrument(skip(self))]
	pub async fn create_project(&self, name: &str) -> Result<Project, DbError> {
		let project = Project::new(ProjectId::generate(), name);
		sqlx::query("INSERT INTO projects (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
			.bind(project.id.to_string())
			.bind(&project.name)
			.bind(project.created_at.to_rfc3339())
			.bind(project.updated_at.to_rfc3339())
			.execute(&self.pool)
			.await?;

		tracing::debug!(project_id = %project.id, "project created");
		Ok(project)
	}

	/// Fetch a project with its owner and member lists.
	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn get_project(&self, project_id: ProjectId) -> Result<Option<Project>, DbError> {
		let row = sqlx::query("SELECT id, name, created_at, updated_at FROM projects WHERE id = ?")
			.bind(project_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let name: String = row.try_get("name")?;
		let created_at: String = row.try_get("created_at")?;
		let updated_at: String = row.try_get("updated_at")?;

		let admins = self.list_owner_ids(project_id).await?;
		let users = self
			.list_members(project_id)
			.await?
			.into_iter()
			.map(|m| m.user_id)
			.collect();

		Ok(Some(Project {
			id: project_id,
			name,
			admins,
			users,
			created_at: parse_timestamp(&created_at)?,
			updated_at: parse_timestamp(&updated_at)?,
		}))
	}

	/// List all project IDs and names.
	#[tracing::instrument(skip(self))]
	pub async fn list_projects(&self) -> Result<Vec<(ProjectId, String)>, DbError> {
		let rows = sqlx::query("SELECT id, name FROM projects ORDER BY name")
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter()
			.map(|row| {
				let id: String = row.try_get("id")?;
				let name: String = row.try_get("name")?;
				Ok((
					id.parse::<uuid::Uuid>()
						.map(ProjectId::new)
						.map_err(|e| DbError::Internal(format!("invalid project id {id}: {e}")))?,
					name,
				))
			})
			.collect()
	}

	/// Add a user to the project's owner list.
	#[tracing::instrument(skip(self), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn add_owner(&self, project_id: ProjectId, user_id: UserId) -> Result<(), DbError> {
		sqlx::query(
			"INSERT OR IGNORE INTO project_admins (project_id, user_id) VALUES (?, ?)",
		)
		.bind(project_id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Remove a user from the project's owner list.
	#[tracing::instrument(skip(self), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn remove_owner(
		&self,
		project_id: ProjectId,
		user_id: UserId,
	) -> Result<bool, DbError> {
		let result =
			sqlx::query("DELETE FROM project_admins WHERE project_id = ? AND user_id = ?")
				.bind(project_id.to_string())
				.bind(user_id.to_string())
				.execute(&self.pool)
				.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Add a member with their referral percentage.
	#[tracing::instrument(skip(self), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn add_member(
		&self,
		project_id: ProjectId,
		user_id: UserId,
		ref_percentage: f64,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO project_users (project_id, user_id, ref_percentage, joined_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(project_id, user_id) DO UPDATE SET ref_percentage = excluded.ref_percentage
			"#,
		)
		.bind(project_id.to_string())
		.bind(user_id.to_string())
		.bind(ref_percentage)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Remove a member from the project.
	#[tracing::instrument(skip(self), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn remove_member(
		&self,
		project_id: ProjectId,
		user_id: UserId,
	) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM project_users WHERE project_id = ? AND user_id = ?")
			.bind(project_id.to_string())
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// List members with their join metadata.
	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn list_members(&self, project_id: ProjectId) -> Result<Vec<MemberInfo>, DbError> {
		let rows = sqlx::query(
			"SELECT user_id, ref_percentage, joined_at FROM project_users WHERE project_id = ? ORDER BY joined_at",
		)
		.bind(project_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter()
			.map(|row| {
				let user_id: String = row.try_get("user_id")?;
				let ref_percentage: f64 = row.try_get("ref_percentage")?;
				let joined_at: String = row.try_get("joined_at")?;
				Ok(MemberInfo {
					user_id: parse_user_id(&user_id)?,
					ref_percentage,
					joined_at: parse_timestamp(&joined_at)?,
				})
			})
			.collect()
	}

	async fn list_owner_ids(&self, project_id: ProjectId) -> Result<Vec<UserId>, DbError> {
		let rows = sqlx::query("SELECT user_id FROM project_admins WHERE project_id = ?")
			.bind(project_id.to_string())
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter()
			.map(|row| {
				let user_id: String = row.try_get("user_id")?;
				parse_user_id(&user_id)
			})
			.collect()
	}
}
