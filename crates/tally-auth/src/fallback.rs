// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Synchronous best-effort permission check.
//!
//! UI gating sometimes needs an answer before any oracle round trip has
//! completed (showing or hiding a control while the page is still loading).
//! [`can_manage_sync`] is that answer: pure, no I/O, no suspension.
//!
//! The check trusts a caller-supplied map of already-resolved oracle
//! results first, and only then falls back to the project's structural
//! owner list. The fallback is conservative on purpose: it cannot see
//! global-admin status, so a global admin who owns nothing resolves to
//! `false` here. That asymmetry is safe only because every privileged
//! mutation is re-validated server-side; do not reuse this check as an
//! authorization boundary.

use std::collections::HashMap;

use crate::project::Project;
use crate::types::{ProjectId, UserId};

/// Decide, without I/O, whether `identity` may manage `project`.
///
/// Priority order:
/// 1. No project or no identity: `false`.
/// 2. An entry for the project in `resolved` (oracle results the caller has
///    already fetched): returned verbatim.
/// 3. The project's structural owner list.
pub fn can_manage_sync(
	identity: Option<UserId>,
	project: Option<&Project>,
	resolved: Option<&HashMap<ProjectId, bool>>,
) -> bool {
	let (Some(user_id), Some(project)) = (identity, project) else {
		return false;
	};

	if let Some(value) = resolved.and_then(|map| map.get(&project.id)) {
		return *value;
	}

	project.lists_owner(user_id)
}
