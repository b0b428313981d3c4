// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API response helpers.
//!
//! All error responses share one JSON shape: a machine-readable `error`
//! code and a human-readable `message`.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

/// Create a 400 Bad Request response.
pub fn bad_request(
	error: impl Into<String>,
	message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
	(StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error, message)))
}

/// Create a 401 Unauthorized response.
pub fn unauthorized(
	error: impl Into<String>,
	message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::UNAUTHORIZED,
		Json(ErrorResponse::new(error, message)),
	)
}

/// Create a 403 Forbidden response.
pub fn forbidden(
	error: impl Into<String>,
	message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::FORBIDDEN,
		Json(ErrorResponse::new(error, message)),
	)
}

/// Create a 404 Not Found response.
pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::NOT_FOUND,
		Json(ErrorResponse::new("not_found", message)),
	)
}

/// Create a 409 Conflict response.
pub fn conflict(
	error: impl Into<String>,
	message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::CONFLICT,
		Json(ErrorResponse::new(error, message)),
	)
}

/// Create a 500 Internal Server Error response.
pub fn internal_error(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(ErrorResponse::new("internal_error", message)),
	)
}
