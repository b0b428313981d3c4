// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Join request repository.
//!
//! Approval is transactional: the request flips to `approved` and the user
//! is added to the project's member list in the same transaction, so a
//! request is never approved without the membership landing.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{JoinRequestId, ProjectId, UserId};

use crate::admin::{parse_timestamp, parse_user_id};
use crate::error::DbError;
use crate::types::{JoinRequest, JoinRequestStatus};

/// Default referral percentage applied when a request does not carry one.
const DEFAULT_REF_PERCENTAGE: f64 = 10.0;

/// Repository for the `join_requests` table.
#[derive(Clone)]
pub struct JoinRequestRepository {
	pool: SqlitePool,
}

impl JoinRequestRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// File a join request for a project.
	#[tracing::instrument(skip(self, message), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn create(
		&self,
		user_id: UserId,
		project_id: ProjectId,
		message: Option<&str>,
		ref_percentage: Option<f64>,
	) -> Result<JoinRequest, DbError> {
		let request = JoinRequest {
			id: JoinRequestId::generate(),
			user_id,
			project_id,
			message: message.map(str::to_string),
			ref_percentage,
			status: JoinRequestStatus::Pending,
			created_at: Utc::now(),
			updated_at: None,
		};

		sqlx::query(
			r#"
			INSERT INTO join_requests (id, user_id, project_id, message, ref_percentage, status, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
			"#,
		)
		.bind(request.id.to_string())
		.bind(request.user_id.to_string())
		.bind(request.project_id.to_string())
		.bind(request.message.as_deref())
		.bind(request.ref_percentage)
		.bind(request.status.to_string())
		.bind(request.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(request)
	}

	/// Fetch a request by ID.
	#[tracing::instrument(skip(self), fields(request_id = %request_id))]
	pub async fn get(&self, request_id: JoinRequestId) -> Result<Option<JoinRequest>, DbError> {
		let row = sqlx::query(
			"SELECT id, user_id, project_id, message, ref_percentage, status, created_at, updated_at FROM join_requests WHERE id = ?",
		)
		.bind(request_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(row_to_request).transpose()
	}

	/// List a project's pending requests, oldest first.
	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn list_pending(&self, project_id: ProjectId) -> Result<Vec<JoinRequest>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, user_id, project_id, message, ref_percentage, status, created_at, updated_at
			FROM join_requests
			WHERE project_id = ? AND status = 'pending'
			ORDER BY created_at
			"#,
		)
		.bind(project_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(row_to_request).collect()
	}

	/// Approve a pending request and add the user to the project's members.
	#[tracing::instrument(skip(self), fields(request_id = %request_id))]
	pub async fn approve(&self, request_id: JoinRequestId) -> Result<JoinRequest, DbError> {
		let request = self
			.get(request_id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("join request {request_id}")))?;

		if request.status != JoinRequestStatus::Pending {
			return Err(DbError::Conflict(format!(
				"join request {request_id} is already {}",
				request.status
			)));
		}

		let now = Utc::now();
		let ref_percentage = request.ref_percentage.unwrap_or(DEFAULT_REF_PERCENTAGE);

		let mut tx = self.pool.begin().await?;

		sqlx::query("UPDATE join_requests SET status = 'approved', updated_at = ? WHERE id = ?")
			.bind(now.to_rfc3339())
			.bind(request_id.to_string())
			.execute(&mut *tx)
			.await?;

		sqlx::query(
			r#"
			INSERT INTO project_users (project_id, user_id, ref_percentage, joined_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(project_id, user_id) DO NOTHING
			"#,
		)
		.bind(request.project_id.to_string())
		.bind(request.user_id.to_string())
		.bind(ref_percentage)
		.bind(now.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		tracing::info!(request_id = %request_id, project_id = %request.project_id, "join request approved");
		Ok(JoinRequest {
			status: JoinRequestStatus::Approved,
			updated_at: Some(now),
			..request
		})
	}

	/// Reject a pending request.
	#[tracing::instrument(skip(self), fields(request_id = %request_id))]
	pub async fn reject(&self, request_id: JoinRequestId) -> Result<JoinRequest, DbError> {
		let request = self
			.get(request_id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("join request {request_id}")))?;

		if request.status != JoinRequestStatus::Pending {
			return Err(DbError::Conflict(format!(
				"join request {request_id} is already {}",
				request.status
			)));
		}

		let now = Utc::now();
		sqlx::query("UPDATE join_requests SET status = 'rejected', updated_at = ? WHERE id = ?")
			.bind(now.to_rfc3339())
			.bind(request_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(JoinRequest {
			status: JoinRequestStatus::Rejected,
			updated_at: Some(now),
			..request
		})
	}
}

fn row_to_request(row: sqlx::sqlite::SqliteRow) -> Result<JoinRequest, DbError> {
	let id: String = row.try_get("id")?;
	let user_id: String = row.try_get("user_id")?;
	let project_id: String = row.try_get("project_id")?;
	let message: Option<String> = row.try_get("message")?;
	let ref_percentage: Option<f64> = row.try_get("ref_percentage")?;
	let status: String = row.try_get("status")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: Option<String> = row.try_get("updated_at")?;

	Ok(JoinRequest {
		id: id
			.parse::<uuid::Uuid>()
			.map(JoinRequestId::new)
			.map_err(|e| DbError::Internal(format!("invalid join request id {id}: {e}")))?,
		user_id: parse_user_id(&user_id)?,
		project_id: project_id
			.parse::<uuid::Uuid>()
			.map(ProjectId::new)
			.map_err(|e| DbError::Internal(format!("invalid project id {project_id}: {e}")))?,
		message,
		ref_percentage,
		status: JoinRequestStatus::parse(&status)
			.ok_or_else(|| DbError::Internal(format!("unknown join request status: {status}")))?,
		created_at: parse_timestamp(&created_at)?,
		updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::project::ProjectRepository;
	use crate::testing::create_tally_test_pool;

	#[tokio::test]
	async fn approve_adds_member_with_requested_percentage() {
		let pool = create_tally_test_pool().await;
		let projects = ProjectRepository::new(pool.clone());
		let requests = JoinRequestRepository::new(pool);

		let user = UserId::generate();
		let project = projects.create_project("alpha").await.unwrap();
		let request = requests
			.create(user, project.id, Some("let me in"), Some(15.0))
			.await
			.unwrap();

		let approved = requests.approve(request.id).await.unwrap();
		assert_eq!(approved.status, JoinRequestStatus::Approved);
		assert!(approved.updated_at.is_some());

		let members = projects.list_members(project.id).await.unwrap();
		assert_eq!(members.len(), 1);
		assert_eq!(members[0].user_id, user);
		assert_eq!(members[0].ref_percentage, 15.0);
	}

	#[tokio::test]
	async fn approve_defaults_percentage_when_absent() {
		let pool = create_tally_test_pool().await;
		let projects = ProjectRepository::new(pool.clone());
		let requests = JoinRequestRepository::new(pool);

		let project = projects.create_project("alpha").await.unwrap();
		let request = requests
			.create(UserId::generate(), project.id, None, None)
			.await
			.unwrap();
		requests.approve(request.id).await.unwrap();

		let members = projects.list_members(project.id).await.unwrap();
		assert_eq!(members[0].ref_percentage, DEFAULT_REF_PERCENTAGE);
	}

	#[tokio::test]
	async fn approve_twice_conflicts() {
		let pool = create_tally_test_pool().await;
		let projects = ProjectRepository::new(pool.clone());
		let requests = JoinRequestRepository::new(pool);

		let project = projects.create_project("alpha").await.unwrap();
		let request = requests
			.create(UserId::generate(), project.id, None, None)
			.await
			.unwrap();

		requests.approve(request.id).await.unwrap();
		assert!(matches!(
			requests.approve(request.id).await,
			Err(DbError::Conflict(_))
		));
	}

	#[tokio::test]
	async fn reject_leaves_membership_untouched() {
		let pool = create_tally_test_pool().await;
		let projects = ProjectRepository::new(pool.clone());
		let requests = JoinRequestRepository::new(pool);

		let project = projects.create_project("alpha").await.unwrap();
		let request = requests
			.create(UserId::generate(), project.id, None, None)
			.await
			.unwrap();

		let rejected = requests.reject(request.id).await.unwrap();
		assert_eq!(rejected.status, JoinRequestStatus::Rejected);
		assert!(projects.list_members(project.id).await.unwrap().is_empty());
		assert!(requests.list_pending(project.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn missing_request_is_not_found() {
		let pool = create_tally_test_pool().await;
		let requests = JoinRequestRepository::new(pool);

		assert!(matches!(
			requests.approve(JoinRequestId::generate()).await,
			Err(DbError::NotFound(_))
		));
	}
}
