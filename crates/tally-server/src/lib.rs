// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tally HTTP server.
//!
//! Exposes the privileged admin endpoints (invite, delete-user), idempotent
//! profile creation, and the project/join-request/commission management
//! routes. Every privileged handler verifies the caller's bearer token
//! against the access-token store and re-checks admin membership
//! server-side.

pub mod api;
pub mod api_response;
pub mod auth;
pub mod config;
pub mod routes;
pub mod testing;

pub use api::{create_router, AppState};
pub use api_response::ErrorResponse;
pub use auth::RequireAuth;
pub use config::{load_config, ServerConfig};
