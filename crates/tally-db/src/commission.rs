// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Commission repository.

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use tally_auth::{CommissionId, ProjectId, UserId};

use crate::admin::parse_user_id;
use crate::error::DbError;
use crate::types::{Commission, CommissionStatus};

/// Parameters for a new commission record.
#[derive(Debug, Clone)]
pub struct NewCommission {
	pub user_id: UserId,
	pub project_id: ProjectId,
	pub client_name: Option<String>,
	pub description: String,
	pub date: NaiveDate,
	pub value: f64,
	pub currency: String,
}

/// Repository for the `commissions` table.
#[derive(Clone)]
pub struct CommissionRepository {
	pool: SqlitePool,
}

impl CommissionRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Record a new commission in `requested` state.
	#[tracing::instrument(skip(self, commission), fields(project_id = %commission.project_id, user_id = %commission.user_id))]
	pub async fn create(&self, commission: NewCommission) -> Result<Commission, DbError> {
		let record = Commission {
			id: CommissionId::generate(),
			user_id: commission.user_id,
			project_id: commission.project_id,
			client_name: commission.client_name,
			description: commission.description,
			date: commission.date,
			status: CommissionStatus::Requested,
			value: commission.value,
			currency: commission.currency,
		};

		sqlx::query(
			r#"
			INSERT INTO commissions (id, user_id, project_id, client_name, description, date, status, value, currency)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(record.id.to_string())
		.bind(record.user_id.to_string())
		.bind(record.project_id.to_string())
		.bind(record.client_name.as_deref())
		.bind(&record.description)
		.bind(record.date.format("%Y-%m-%d").to_string())
		.bind(record.status.to_string())
		.bind(record.value)
		.bind(&record.currency)
		.execute(&self.pool)
		.await?;

		Ok(record)
	}

	/// List a project's commissions, optionally filtered by year and month.
	///
	/// Dates are stored as `YYYY-MM-DD`, so the filters are prefix matches.
	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn list_for_project(
		&self,
		project_id: ProjectId,
		year: Option<i32>,
		month: Option<u32>,
	) -> Result<Vec<Commission>, DbError> {
		let prefix = match (year, month) {
			(Some(year), Some(month)) => format!("{year:04}-{month:02}%"),
			(Some(year), None) => format!("{year:04}%"),
			_ => "%".to_string(),
		};

		let rows = sqlx::query(
			r#"
			SELECT id, user_id, project_id, client_name, description, date, status, value, currency
			FROM commissions
			WHERE project_id = ? AND date LIKE ?
			ORDER BY date
			"#,
		)
		.bind(project_id.to_string())
		.bind(prefix)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(row_to_commission).collect()
	}

	/// Move a requested commission to `confirmed`.
	///
	/// Returns `false` if the commission does not exist or is not in the
	/// `requested` state.
	#[tracing::instrument(skip(self), fields(commission_id = %commission_id))]
	pub async fn confirm(&self, commission_id: CommissionId) -> Result<bool, DbError> {
		let result =
			sqlx::query("UPDATE commissions SET status = 'confirmed' WHERE id = ? AND status = 'requested'")
				.bind(commission_id.to_string())
				.execute(&self.pool)
				.await?;

		Ok(result.rows_affected() > 0)
	}
}

fn row_to_commission(row: sqlx::sqlite::SqliteRow) -> Result<Commission, DbError> {
	let id: String = row.try_get("id")?;
	let user_id: String = row.try_get("user_id")?;
	let project_id: String = row.try_get("project_id")?;
	let client_name: Option<String> = row.try_get("client_name")?;
	let description: String = row.try_get("description")?;
	let date: String = row.try_get("date")?;
	let status: String = row.try_get("status")?;
	let value: f64 = row.try_get("value")?;
	let currency: String = row.try_get("currency")?;

	Ok(Commission {
		id: id
			.parse::<uuid::Uuid>()
			.map(CommissionId::new)
			.map_err(|e| DbError::Internal(format!("invalid commission id {id}: {e}")))?,
		user_id: parse_user_id(&user_id)?,
		project_id: project_id
			.parse::<uuid::Uuid>()
			.map(ProjectId::new)
			.map_err(|e| DbError::Internal(format!("invalid project id {project_id}: {e}")))?,
		client_name,
		description,
		date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
			.map_err(|e| DbError::Internal(format!("invalid date {date}: {e}")))?,
		status: CommissionStatus::parse(&status)
			.ok_or_else(|| DbError::Internal(format!("unknown commission status: {status}")))?,
		value,
		currency,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_tally_test_pool;

	fn new_commission(project_id: ProjectId, date: &str, value: f64) -> NewCommission {
		NewCommission {
			user_id: UserId::generate(),
			project_id,
			client_name: None,
			description: "deal".to_string(),
			date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
			value,
			currency: "USD".to_string(),
		}
	}

	#[tokio::test]
	async fn created_commission_starts_requested() {
		let pool = create_tally_test_pool().await;
		let repo = CommissionRepository::new(pool);

		let project_id = ProjectId::generate();
		let record = repo
			.create(new_commission(project_id, "2026-03-15", 100.0))
			.await
			.unwrap();
		assert_eq!(record.status, CommissionStatus::Requested);

		let listed = repo.list_for_project(project_id, None, None).await.unwrap();
		assert_eq!(listed.len(), 1);
		assert_eq!(listed[0].id, record.id);
	}

	#[tokio::test]
	async fn year_and_month_filters_are_prefix_matches() {
		let pool = create_tally_test_pool().await;
		let repo = CommissionRepository::new(pool);

		let project_id = ProjectId::generate();
		repo.create(new_commission(project_id, "2025-12-31", 1.0))
			.await
			.unwrap();
		repo.create(new_commission(project_id, "2026-01-02", 2.0))
			.await
			.unwrap();
		repo.create(new_commission(project_id, "2026-03-15", 3.0))
			.await
			.unwrap();

		let year = repo
			.list_for_project(project_id, Some(2026), None)
			.await
			.unwrap();
		assert_eq!(year.len(), 2);

		let month = repo
			.list_for_project(project_id, Some(2026), Some(3))
			.await
			.unwrap();
		assert_eq!(month.len(), 1);
		assert_eq!(month[0].value, 3.0);
	}

	#[tokio::test]
	async fn confirm_only_applies_to_requested() {
		let pool = create_tally_test_pool().await;
		let repo = CommissionRepository::new(pool);

		let project_id = ProjectId::generate();
		let record = repo
			.create(new_commission(project_id, "2026-02-01", 50.0))
			.await
			.unwrap();

		assert!(repo.confirm(record.id).await.unwrap());
		// Already confirmed: no-op.
		assert!(!repo.confirm(record.id).await.unwrap());
		// Unknown ID: no-op.
		assert!(!repo.confirm(CommissionId::generate()).await.unwrap());

		let listed = repo.list_for_project(project_id, None, None).await.unwrap();
		assert_eq!(listed[0].status, CommissionStatus::Confirmed);
	}
}
