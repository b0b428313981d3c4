// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project membership and ownership HTTP handlers.
//!
//! All four endpoints are admin-gated. Member additions default the
//! referral percentage when the request omits one.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tally_auth::{ProjectId, UserId};

use crate::api::AppState;
use crate::api_response::{internal_error, not_found, ErrorResponse};
use crate::auth::{require_admin, RequireAuth};

/// Referral percentage used when an add-member request omits one.
const DEFAULT_REF_PERCENTAGE: f64 = 10.0;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
	pub user_id: Uuid,
	pub ref_percentage: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddOwnerRequest {
	pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
	pub ok: bool,
}

fn ok() -> (StatusCode, Json<OkResponse>) {
	(StatusCode::OK, Json(OkResponse { ok: true }))
}

/// Look up the project or answer 404, then run the admin re-check.
async fn admin_gate(
	state: &AppState,
	actor_id: UserId,
	project_id: ProjectId,
) -> Result<(), axum::response::Response> {
	if let Err(rejection) = require_admin(state, actor_id).await {
		return Err(rejection.into_response());
	}

	match state.projects.get_project(project_id).await {
		Ok(Some(_)) => Ok(()),
		Ok(None) => Err(not_found("Project not found").into_response()),
		Err(error) => {
			tracing::error!(%error, project_id = %project_id, "failed to load project");
			Err(internal_error("Failed to load project").into_response())
		}
	}
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/members",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
/// POST /api/projects/{id}/members - Add a member to a project.
#[tracing::instrument(skip(state, payload), fields(actor_id = %actor_id, project_id = %id))]
pub async fn add_member(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(payload): Json<AddMemberRequest>,
) -> impl IntoResponse {
	let project_id = ProjectId::new(id);
	if let Err(rejection) = admin_gate(&state, actor_id, project_id).await {
		return rejection;
	}

	let ref_percentage = payload.ref_percentage.unwrap_or(DEFAULT_REF_PERCENTAGE);
	match state
		.projects
		.add_member(project_id, UserId::new(payload.user_id), ref_percentage)
		.await
	{
		Ok(()) => ok().into_response(),
		Err(error) => {
			tracing::error!(%error, project_id = %project_id, "failed to add member");
			internal_error("Failed to add member").into_response()
		}
	}
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Member removed", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Project or membership not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
/// DELETE /api/projects/{id}/members/{user_id} - Remove a project member.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, project_id = %id))]
pub async fn remove_member(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
	let project_id = ProjectId::new(id);
	if let Err(rejection) = admin_gate(&state, actor_id, project_id).await {
		return rejection;
	}

	match state
		.projects
		.remove_member(project_id, UserId::new(user_id))
		.await
	{
		Ok(true) => ok().into_response(),
		Ok(false) => not_found("User is not a member of this project").into_response(),
		Err(error) => {
			tracing::error!(%error, project_id = %project_id, "failed to remove member");
			internal_error("Failed to remove member").into_response()
		}
	}
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/owners",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = AddOwnerRequest,
    responses(
        (status = 200, description = "Owner added", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
/// POST /api/projects/{id}/owners - Add a user to a project's owner list.
#[tracing::instrument(skip(state, payload), fields(actor_id = %actor_id, project_id = %id))]
pub async fn add_owner(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(payload): Json<AddOwnerRequest>,
) -> impl IntoResponse {
	let project_id = ProjectId::new(id);
	if let Err(rejection) = admin_gate(&state, actor_id, project_id).await {
		return rejection;
	}

	match state
		.projects
		.add_owner(project_id, UserId::new(payload.user_id))
		.await
	{
		Ok(()) => ok().into_response(),
		Err(error) => {
			tracing::error!(%error, project_id = %project_id, "failed to add owner");
			internal_error("Failed to add owner").into_response()
		}
	}
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/owners/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Owner removed", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Project or ownership not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
/// DELETE /api/projects/{id}/owners/{user_id} - Remove a project owner.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, project_id = %id))]
pub async fn remove_owner(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
	let project_id = ProjectId::new(id);
	if let Err(rejection) = admin_gate(&state, actor_id, project_id).await {
		return rejection;
	}

	match state
		.projects
		.remove_owner(project_id, UserId::new(user_id))
		.await
	{
		Ok(true) => ok().into_response(),
		Ok(false) => not_found("User is not an owner of this project").into_response(),
		Err(error) => {
			tracing::error!(%error, project_id = %project_id, "failed to remove owner");
			internal_error("Failed to remove owner").into_response()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::create_router;
	use crate::testing::{authed_request, setup_state};
	use tower::ServiceExt;

	#[tokio::test]
	async fn add_member_defaults_percentage() {
		let (state, admin_token) = setup_state().await;
		let projects = state.projects.clone();
		let project = projects.create_project("alpha").await.unwrap();
		let member = UserId::generate();
		let app = create_router(state);

		let body = format!(r#"{{"user_id":"{member}"}}"#);
		let response = app
			.oneshot(authed_request(
				"POST",
				&format!("/api/projects/{}/members", project.id),
				&admin_token,
				Some(&body),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let members = projects.list_members(project.id).await.unwrap();
		assert_eq!(members.len(), 1);
		assert_eq!(members[0].ref_percentage, DEFAULT_REF_PERCENTAGE);
	}

	#[tokio::test]
	async fn membership_routes_404_on_unknown_project() {
		let (state, admin_token) = setup_state().await;
		let app = create_router(state);

		let body = format!(r#"{{"user_id":"{}"}}"#, UserId::generate());
		let response = app
			.oneshot(authed_request(
				"POST",
				&format!("/api/projects/{}/members", ProjectId::generate()),
				&admin_token,
				Some(&body),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn owner_add_and_remove_round_trip() {
		let (state, admin_token) = setup_state().await;
		let projects = state.projects.clone();
		let project = projects.create_project("alpha").await.unwrap();
		let owner = UserId::generate();
		let app = create_router(state);

		let body = format!(r#"{{"user_id":"{owner}"}}"#);
		let added = app
			.clone()
			.oneshot(authed_request(
				"POST",
				&format!("/api/projects/{}/owners", project.id),
				&admin_token,
				Some(&body),
			))
			.await
			.unwrap();
		assert_eq!(added.status(), StatusCode::OK);
		assert!(projects
			.get_project(project.id)
			.await
			.unwrap()
			.unwrap()
			.admins
			.contains(&owner));

		let removed = app
			.clone()
			.oneshot(authed_request(
				"DELETE",
				&format!("/api/projects/{}/owners/{owner}", project.id),
				&admin_token,
				None,
			))
			.await
			.unwrap();
		assert_eq!(removed.status(), StatusCode::OK);

		// Removing again reports the missing ownership.
		let again = app
			.oneshot(authed_request(
				"DELETE",
				&format!("/api/projects/{}/owners/{owner}", project.id),
				&admin_token,
				None,
			))
			.await
			.unwrap();
		assert_eq!(again.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn non_admin_cannot_manage_membership() {
		let (state, _) = setup_state().await;
		let project = state.projects.create_project("alpha").await.unwrap();
		let outsider_token = state.tokens.issue(UserId::generate()).await.unwrap();
		let app = create_router(state);

		let body = format!(r#"{{"user_id":"{}"}}"#, UserId::generate());
		let response = app
			.oneshot(authed_request(
				"POST",
				&format!("/api/projects/{}/members", project.id),
				&outsider_token,
				Some(&body),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}
}
