// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use axum::{
	routing::{delete, get, post},
	Router,
};
use sqlx::sqlite::SqlitePool;

use tally_db::{
	AccessTokenRepository, AdminRepository, CommissionRepository, JoinRequestRepository,
	ProjectRepository, UserRepository,
};

use crate::routes;

/// Shared state handed to every handler.
///
/// Repositories are cheap clones over the same pool.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub users: UserRepository,
	pub admins: AdminRepository,
	pub projects: ProjectRepository,
	pub commissions: CommissionRepository,
	pub join_requests: JoinRequestRepository,
	pub tokens: AccessTokenRepository,
}

impl AppState {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			users: UserRepository::new(pool.clone()),
			admins: AdminRepository::new(pool.clone()),
			projects: ProjectRepository::new(pool.clone()),
			commissions: CommissionRepository::new(pool.clone()),
			join_requests: JoinRequestRepository::new(pool.clone()),
			tokens: AccessTokenRepository::new(pool.clone()),
			pool,
		}
	}
}

/// Build the full API router.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/profile/create", post(routes::profile::create_profile))
		.route("/api/admin/invite", post(routes::admin::invite))
		.route("/api/admin/delete-user", post(routes::admin::delete_user))
		.route(
			"/api/projects/{id}/members",
			post(routes::projects::add_member),
		)
		.route(
			"/api/projects/{id}/members/{user_id}",
			delete(routes::projects::remove_member),
		)
		.route(
			"/api/projects/{id}/owners",
			post(routes::projects::add_owner),
		)
		.route(
			"/api/projects/{id}/owners/{user_id}",
			delete(routes::projects::remove_owner),
		)
		.route(
			"/api/join-requests/{id}/approve",
			post(routes::join_requests::approve),
		)
		.route(
			"/api/join-requests/{id}/reject",
			post(routes::join_requests::reject),
		)
		.route(
			"/api/commissions/{id}/confirm",
			post(routes::commissions::confirm),
		)
		.with_state(state)
}
