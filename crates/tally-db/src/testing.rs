// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::schema::apply_schema;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

/// In-memory pool with the full Tally schema applied.
pub async fn create_tally_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	apply_schema(&pool).await.unwrap();
	pool
}
