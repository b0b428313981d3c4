// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Commission HTTP handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tally_auth::CommissionId;

use crate::api::AppState;
use crate::api_response::{conflict, internal_error, ErrorResponse};
use crate::auth::{require_admin, RequireAuth};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
	pub ok: bool,
}

#[utoipa::path(
    post,
    path = "/api/commissions/{id}/confirm",
    params(("id" = Uuid, Path, description = "Commission ID")),
    responses(
        (status = 200, description = "Commission confirmed", body = OkResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 409, description = "Commission missing or already confirmed", body = ErrorResponse)
    ),
    tag = "commissions"
)]
/// POST /api/commissions/{id}/confirm - Confirm a requested commission.
#[tracing::instrument(skip(state), fields(actor_id = %actor_id, commission_id = %id))]
pub async fn confirm(
	RequireAuth(actor_id): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> impl IntoResponse {
	if let Err(rejection) = require_admin(&state, actor_id).await {
		return rejection.into_response();
	}

	match state.commissions.confirm(CommissionId::new(id)).await {
		Ok(true) => (StatusCode::OK, Json(OkResponse { ok: true })).into_response(),
		Ok(false) => conflict(
			"not_confirmable",
			"Commission does not exist or is not in the requested state",
		)
		.into_response(),
		Err(error) => {
			tracing::error!(%error, commission_id = %id, "failed to confirm commission");
			internal_error("Failed to confirm commission").into_response()
		}
	}
}
