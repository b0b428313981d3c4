// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity and role resolution for Tally.
//!
//! This crate is the authorization core of the commission tracker:
//!
//! - [`identity`]: the current authenticated subject and its lifecycle
//!   events
//! - [`oracle`]: the typed contract for the remote permission predicates
//! - [`resolver`]: the cached, deduplicating role resolver (the heart of
//!   the crate)
//! - [`fallback`]: the synchronous best-effort management check for UI
//!   gating
//! - [`token`]: bearer access tokens for the privileged server endpoints
//!
//! The resolver's booleans gate UI affordances only. Every privileged
//! mutation is re-validated server-side in `tally-server`; nothing in this
//! crate is an authorization boundary on its own.

pub mod fallback;
pub mod identity;
pub mod oracle;
pub mod project;
pub mod resolver;
pub mod token;
pub mod types;

pub use fallback::can_manage_sync;
pub use identity::{AuthEvent, ChangeSubscription, IdentitySource};
pub use oracle::{AdminDirectory, OracleError, PermissionOracle};
pub use project::Project;
pub use resolver::RoleResolver;
pub use token::{extract_bearer_token, hash_access_token, ACCESS_TOKEN_PREFIX};
pub use types::{AdminRole, CommissionId, JoinRequestId, ProjectId, UserId};
