// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access tokens for the privileged server endpoints.
//!
//! Tokens are bearer credentials with the `tk_` prefix. Only the SHA-256
//! hash is ever persisted; the raw token is shown once at creation and
//! never logged.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix identifying a Tally access token.
pub const ACCESS_TOKEN_PREFIX: &str = "tk_";

/// Number of random bytes in a generated token.
const TOKEN_RANDOM_BYTES: usize = 32;

/// Generate a new access token.
pub fn generate_access_token() -> String {
	let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	format!("{ACCESS_TOKEN_PREFIX}{}", hex::encode(bytes))
}

/// Hash a token for storage or lookup.
pub fn hash_access_token(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

/// Check if a bearer value looks like a Tally access token.
pub fn is_access_token(token: &str) -> bool {
	token.starts_with(ACCESS_TOKEN_PREFIX)
}

/// Extract a bearer token from the Authorization header.
///
/// Expects the format: `Authorization: Bearer <token>`. Returns `None` if
/// the header is absent or malformed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let auth_header = headers.get(AUTHORIZATION)?;
	let auth_str = auth_header.to_str().ok()?;
	auth_str
		.strip_prefix("Bearer ")
		.map(|token| token.to_string())
}
