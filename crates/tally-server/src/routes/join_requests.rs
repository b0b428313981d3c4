// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Join request HTTP handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tally_auth::JoinRequestId;
use tally_db::{DbError, JoinRequest};

use crate::api::AppState;
use crate::api_response::{conflict, internal_error, not_found, ErrorResponse};
use crate::auth::{require_admin, RequireAuth};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinRequestResponse {
	pub id: Uuid,
	pub user_id: Uuid,
	pub project_id: Uuid,
	pub status: String,
}

impl From<JoinRequest> for JoinRequestResponse {
	fn from(request: JoinRequest) -> Self {
		Self {
			id: request.id.into_inner(),
			user_id: request.user_id.into_inner(),
			project_id: request.project_id.into_inner(),
			status: request.status.to_string(),
		}
	}
}

fn map_decision_result(
	result: Result<JoinRequest, DbError>,
	action: &str,
) -> axum::response::Response {
	match result {
		Ok(request) => (
			StatusCode::OK,
			Json(JoinRequestResponse::from(request)),
		)
			.into_response(),
		Err(DbError::NotFound(message)) => not_found(message).into_response(),
		Err(DbError::Conflict(message)) => conflict("conflict", message).into_response(),
		Err(error) => {
			tracing::error!(%error, action, "join request decision failed");
			internal_error(format!("Failed to {action} join request")).into_response()
		}
	}
}

#[utoipa::path(
    post,
    path = "/api/join-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Join request ID")),
    responses(
        (status = 200, description = "Request approved", body = JoinRequestResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already decided", body = ErrorResponse)
    ),
    tag = "join-requests"
)]
/// POST /api/join-requests/{id}/approve - Approve a pending join request.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, request_id = %id))]
pub async fn approve(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> impl IntoResponse {
	if let Err(rejection) = require_admin(&state, actor_id).await {
		return rejection.into_response();
	}

	map_decision_result(
		state.join_requests.approve(JoinRequestId::new(id)).await,
		"approve",
	)
}

#[utoipa::path(
    post,
    path = "/api/join-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Join request ID")),
    responses(
        (status = 200, description = "Request rejected", body = JoinRequestResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already decided", body = ErrorResponse)
    ),
    tag = "join-requests"
)]
/// POST /api/join-requests/{id}/reject - Reject a pending join request.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, request_id = %id))]
pub async fn reject(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> impl IntoResponse {
	if let Err(rejection) = require_admin(&state, actor_id).await {
		return rejection.into_response();
	}

	map_decision_result(
		state.join_requests.reject(JoinRequestId::new(id)).await,
		"reject",
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::create_router;
	use crate::testing::{authed_request, setup_state};
	use tally_auth::UserId;
	use tower::ServiceExt;

	#[tokio::test]
	async fn approve_adds_member_and_flips_status() {
		let (state, admin_token) = setup_state().await;
		let projects = state.projects.clone();
		let requests = state.join_requests.clone();

		let project = projects.create_project("alpha").await.unwrap();
		let user = UserId::generate();
		let request = requests
			.create(user, project.id, None, Some(20.0))
			.await
			.unwrap();
		let app = create_router(state);

		let response = app
			.oneshot(authed_request(
				"POST",
				&format!("/api/join-requests/{}/approve", request.id),
				&admin_token,
				None,
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let members = projects.list_members(project.id).await.unwrap();
		assert_eq!(members.len(), 1);
		assert_eq!(members[0].user_id, user);
	}

	#[tokio::test]
	async fn double_decision_conflicts() {
		let (state, admin_token) = setup_state().await;
		let project = state.projects.create_project("alpha").await.unwrap();
		let request = state
			.join_requests
			.create(UserId::generate(), project.id, None, None)
			.await
			.unwrap();
		let app = create_router(state);

		let uri = format!("/api/join-requests/{}/reject", request.id);
		let first = app
			.clone()
			.oneshot(authed_request("POST", &uri, &admin_token, None))
			.await
			.unwrap();
		assert_eq!(first.status(), StatusCode::OK);

		let second = app
			.oneshot(authed_request("POST", &uri, &admin_token, None))
			.await
			.unwrap();
		assert_eq!(second.status(), StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn unknown_request_is_not_found() {
		let (state, admin_token) = setup_state().await;
		let app = create_router(state);

		let response = app
			.oneshot(authed_request(
				"POST",
				&format!("/api/join-requests/{}/approve", JoinRequestId::generate()),
				&admin_token,
				None,
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}
}
