// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;

use crate::error::SessionStoreError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a SqlitePool with WAL mode, foreign keys and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./relay.db")
///
/// # Errors
/// Returns `SessionStoreError::Configuration` if the URL is invalid and
/// `SessionStoreError::StorageUnavailable` if the database cannot be opened.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, SessionStoreError> {
	create_pool_with_max_connections(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Like [`create_pool`] with an explicit connection limit.
///
/// In-memory databases are private to a connection, so they always get a
/// single-connection pool.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool_with_max_connections(
	database_url: &str,
	max_connections: u32,
) -> Result<SqlitePool, SessionStoreError> {
	if max_connections == 0 {
		return Err(SessionStoreError::Configuration(
			"max_connections must be at least 1".to_string(),
		));
	}

	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| SessionStoreError::Configuration(format!("invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let max_connections = if database_url.contains(":memory:") {
		1
	} else {
		max_connections
	};

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections)
		.connect_with(options)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(_) | sqlx::Error::Io(_) => SessionStoreError::StorageUnavailable(e),
			other => SessionStoreError::from(other),
		})?;

	tracing::debug!(max_connections, "database pool created");
	Ok(pool)
}
