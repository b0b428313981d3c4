// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Tally.
//!
//! Repositories for user profiles, the admin directory, projects and their
//! owner/member lists, commissions, join requests, and access tokens.
//! Also home to [`SqliteOracle`], the concrete permission oracle the role
//! resolver wraps.

pub mod admin;
pub mod commission;
pub mod error;
pub mod join_request;
pub mod oracle;
pub mod pool;
pub mod project;
pub mod schema;
pub mod testing;
pub mod token;
pub mod types;
pub mod user;

pub use admin::AdminRepository;
pub use commission::{CommissionRepository, NewCommission};
pub use error::{DbError, Result};
pub use join_request::JoinRequestRepository;
pub use oracle::SqliteOracle;
pub use pool::create_pool;
pub use project::{MemberInfo, ProjectRepository};
pub use schema::apply_schema;
pub use token::AccessTokenRepository;
pub use types::{
	AdminRecord, Commission, CommissionStatus, JoinRequest, JoinRequestStatus, UserProfile,
};
pub use user::UserRepository;
