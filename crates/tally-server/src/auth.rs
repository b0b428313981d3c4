// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer authentication for privileged endpoints.
//!
//! Authorization decisions never trust client-side state. Every privileged
//! handler re-verifies the bearer token against the access-token store and,
//! where admin access is required, re-checks admin membership in the
//! directory.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode, Json};

use tally_auth::{extract_bearer_token, AdminRole, UserId};

use crate::api::AppState;
use crate::api_response::{forbidden, internal_error, unauthorized, ErrorResponse};

/// Extractor that resolves the bearer token to an authenticated user.
///
/// Rejects with 401 when the header is missing, malformed, or the token is
/// unknown or revoked.
pub struct RequireAuth(pub UserId);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = (StatusCode, Json<ErrorResponse>);

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let Some(token) = extract_bearer_token(&parts.headers) else {
			return Err(unauthorized(
				"unauthorized",
				"Missing or invalid Authorization header",
			));
		};

		match state.tokens.verify(&token).await {
			Ok(Some(user_id)) => Ok(RequireAuth(user_id)),
			Ok(None) => Err(unauthorized("invalid_token", "Invalid token")),
			Err(error) => {
				tracing::error!(%error, "token verification failed");
				Err(internal_error("Failed to verify token"))
			}
		}
	}
}

/// Re-check the caller's admin membership server-side.
///
/// Returns 403 for non-members. Directory failures are 500, never a grant.
pub async fn require_admin(
	state: &AppState,
	user_id: UserId,
) -> Result<AdminRole, (StatusCode, Json<ErrorResponse>)> {
	match state.admins.get(user_id).await {
		Ok(Some(record)) => Ok(record.role),
		Ok(None) => Err(forbidden("forbidden", "Admin access required")),
		Err(error) => {
			tracing::error!(%error, user_id = %user_id, "admin membership check failed");
			Err(internal_error("Failed to check admin membership"))
		}
	}
}
