// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
	pub status: String,
	pub database: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Liveness check with a database ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database = sqlx::query_scalar::<_, i64>("SELECT 1")
		.fetch_one(&state.pool)
		.await
		.is_ok();

	let status = if database {
		StatusCode::OK
	} else {
		StatusCode::SERVICE_UNAVAILABLE
	};

	(
		status,
		Json(HealthResponse {
			status: if database { "ok" } else { "degraded" }.to_string(),
			database,
		}),
	)
}
