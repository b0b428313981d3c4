// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler test helpers.

use axum::body::Body;
use axum::http::Request;

use tally_auth::{AdminRole, UserId};
use tally_db::testing::create_tally_test_pool;

use crate::api::AppState;

/// Fresh in-memory state plus a bearer token for a global admin.
pub async fn setup_state() -> (AppState, String) {
	let pool = create_tally_test_pool().await;
	let state = AppState::new(pool);

	let admin = UserId::generate();
	state
		.admins
		.grant(admin, AdminRole::GlobalAdmin)
		.await
		.unwrap();
	let token = state.tokens.issue(admin).await.unwrap();

	(state, token)
}

/// Build a request with a bearer token and optional JSON body.
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<Body> {
	let builder = Request::builder()
		.method(method)
		.uri(uri)
		.header("authorization", format!("Bearer {token}"));

	match body {
		Some(json) => builder
			.header("content-type", "application/json")
			.body(Body::from(json.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	}
}
