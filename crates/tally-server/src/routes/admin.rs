// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Privileged admin HTTP handlers.
//!
//! # Authorization Matrix
//!
//! | Endpoint                 | Required Permission |
//! |--------------------------|---------------------|
//! | `POST /api/admin/invite` | admin directory     |
//! | `POST /api/admin/delete-user` | admin directory |
//!
//! Both endpoints re-verify the bearer token and re-check admin membership
//! server-side; client-held role state is never consulted.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tally_auth::UserId;
use tally_db::DbError;

use crate::api::AppState;
use crate::api_response::{bad_request, conflict, internal_error, not_found, ErrorResponse};
use crate::auth::{require_admin, RequireAuth};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteRequest {
	pub email: String,
	pub name: Option<String>,
	#[serde(default)]
	pub make_admin: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteResponse {
	pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteUserRequest {
	pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
	pub ok: bool,
}

#[utoipa::path(
    post,
    path = "/api/admin/invite",
    request_body = InviteRequest,
    responses(
        (status = 200, description = "User invited", body = InviteResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "admin"
)]
/// POST /api/admin/invite - Invite a user, optionally as a global admin.
#[tracing::instrument(skip(state, payload), fields(actor_id = %actor_id))]
pub async fn invite(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<InviteRequest>,
) -> impl IntoResponse {
	if let Err(rejection) = require_admin(&state, actor_id).await {
		return rejection.into_response();
	}

	if payload.email.trim().is_empty() {
		return bad_request("invalid_request", "Email is required").into_response();
	}

	match state
		.users
		.invite(&payload.email, payload.name.as_deref(), payload.make_admin)
		.await
	{
		Ok(user_id) => (
			StatusCode::OK,
			Json(InviteResponse {
				user_id: user_id.into_inner(),
			}),
		)
			.into_response(),
		Err(DbError::Conflict(message)) => conflict("conflict", message).into_response(),
		Err(error) => {
			tracing::error!(%error, actor_id = %actor_id, "failed to invite user");
			internal_error("Failed to invite user").into_response()
		}
	}
}

#[utoipa::path(
    post,
    path = "/api/admin/delete-user",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
/// POST /api/admin/delete-user - Delete a user and all dependent records.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, target = %payload.user_id))]
pub async fn delete_user(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<DeleteUserRequest>,
) -> impl IntoResponse {
	if let Err(rejection) = require_admin(&state, actor_id).await {
		return rejection.into_response();
	}

	match state.users.delete_user(UserId::new(payload.user_id)).await {
		Ok(true) => (StatusCode::OK, Json(OkResponse { ok: true })).into_response(),
		Ok(false) => not_found("User not found").into_response(),
		Err(error) => {
			tracing::error!(%error, actor_id = %actor_id, "failed to delete user");
			internal_error("Failed to delete user").into_response()
		}
	}
}
