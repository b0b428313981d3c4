// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Profile HTTP handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tally_db::UserProfile;

use crate::api::AppState;
use crate::api_response::{bad_request, internal_error, ErrorResponse};
use crate::auth::RequireAuth;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
	pub email: String,
	pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
	pub id: Uuid,
	pub email: String,
	pub name: Option<String>,
	pub created: bool,
}

impl ProfileResponse {
	fn from_profile(profile: UserProfile, created: bool) -> Self {
		Self {
			id: profile.id.into_inner(),
			email: profile.email,
			name: profile.name,
			created,
		}
	}
}

#[utoipa::path(
    post,
    path = "/api/profile/create",
    request_body = CreateProfileRequest,
    responses(
        (status = 200, description = "Profile exists or was created", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "profile"
)]
/// POST /api/profile/create - Idempotent profile creation for the caller.
#[tracing::instrument(skip(state, payload), fields(user_id = %user_id))]
pub async fn create_profile(
	RequireAuth(user_id): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<CreateProfileRequest>,
) -> impl IntoResponse {
	if payload.email.trim().is_empty() {
		return bad_request("invalid_request", "Email is required").into_response();
	}

	match state
		.users
		.create_profile_if_missing(user_id, &payload.email, payload.name.as_deref())
		.await
	{
		Ok((profile, created)) => (
			StatusCode::OK,
			Json(ProfileResponse::from_profile(profile, created)),
		)
			.into_response(),
		Err(error) => {
			tracing::error!(%error, user_id = %user_id, "failed to create profile");
			internal_error("Failed to create profile").into_response()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::create_router;
	use crate::testing::{authed_request, setup_state};
	use axum::body::to_bytes;
	use tower::ServiceExt;

	#[tokio::test]
	async fn create_profile_requires_auth() {
		let (state, _) = setup_state().await;
		let app = create_router(state);

		let request = http::Request::builder()
			.method("POST")
			.uri("/api/profile/create")
			.header("content-type", "application/json")
			.body(axum::body::Body::from(r#"{"email":"a@example.com"}"#))
			.unwrap();

		let response = app.oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn create_profile_is_idempotent() {
		let (state, _) = setup_state().await;
		let user = tally_auth::UserId::generate();
		let token = state.tokens.issue(user).await.unwrap();
		let app = create_router(state);

		let body = r#"{"email":"a@example.com","name":"A"}"#;
		let first = app
			.clone()
			.oneshot(authed_request(
				"POST",
				"/api/profile/create",
				&token,
				Some(body),
			))
			.await
			.unwrap();
		assert_eq!(first.status(), StatusCode::OK);
		let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
		let parsed: ProfileResponse = serde_json::from_slice(&bytes).unwrap();
		assert!(parsed.created);

		let second = app
			.oneshot(authed_request(
				"POST",
				"/api/profile/create",
				&token,
				Some(body),
			))
			.await
			.unwrap();
		let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
		let parsed: ProfileResponse = serde_json::from_slice(&bytes).unwrap();
		assert!(!parsed.created);
	}

	#[tokio::test]
	async fn empty_email_is_rejected() {
		let (state, _) = setup_state().await;
		let user = tally_auth::UserId::generate();
		let token = state.tokens.issue(user).await.unwrap();
		let app = create_router(state);

		let response = app
			.oneshot(authed_request(
				"POST",
				"/api/profile/create",
				&token,
				Some(r#"{"email":"  "}"#),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}
}
