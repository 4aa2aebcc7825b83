// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::repository::SqliteSessionStore;
use crate::schema::run_migrations;

/// Single-connection in-memory pool with the session schema applied.
pub async fn create_test_pool() -> SqlitePool {
	let pool = crate::pool::create_pool("sqlite::memory:").await.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn create_test_store() -> SqliteSessionStore {
	SqliteSessionStore::new(create_test_pool().await)
}
