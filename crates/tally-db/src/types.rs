// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain records persisted by the repositories.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use tally_auth::{AdminRole, CommissionId, JoinRequestId, ProjectId, UserId};

/// A user profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: UserId,
	pub email: String,
	pub name: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// An admin-directory row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRecord {
	pub id: UserId,
	pub role: AdminRole,
	pub created_at: DateTime<Utc>,
}

/// Lifecycle of a commission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
	Requested,
	Confirmed,
	Paid,
}

impl CommissionStatus {
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"requested" => Some(Self::Requested),
			"confirmed" => Some(Self::Confirmed),
			"paid" => Some(Self::Paid),
			_ => None,
		}
	}
}

impl fmt::Display for CommissionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Requested => write!(f, "requested"),
			Self::Confirmed => write!(f, "confirmed"),
			Self::Paid => write!(f, "paid"),
		}
	}
}

/// A commission earned by a user on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commission {
	pub id: CommissionId,
	pub user_id: UserId,
	pub project_id: ProjectId,
	pub client_name: Option<String>,
	pub description: String,
	pub date: NaiveDate,
	pub status: CommissionStatus,
	pub value: f64,
	pub currency: String,
}

/// Lifecycle of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
	Pending,
	Approved,
	Rejected,
}

impl JoinRequestStatus {
	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"pending" => Some(Self::Pending),
			"approved" => Some(Self::Approved),
			"rejected" => Some(Self::Rejected),
			_ => None,
		}
	}
}

impl fmt::Display for JoinRequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pending => write!(f, "pending"),
			Self::Approved => write!(f, "approved"),
			Self::Rejected => write!(f, "rejected"),
		}
	}
}

/// A request by a user to join a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
	pub id: JoinRequestId,
	pub user_id: UserId,
	pub project_id: ProjectId,
	pub message: Option<String>,
	pub ref_percentage: Option<f64>,
	pub status: JoinRequestStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: Option<DateTime<Utc>>,
}
