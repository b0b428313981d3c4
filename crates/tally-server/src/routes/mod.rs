// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod admin;
pub mod commissions;
pub mod health;
pub mod join_requests;
pub mod profile;
pub mod projects;
