// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the session store.

use thiserror::Error;

/// Errors that can occur in the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
	/// A session with this `session_id` already exists
	#[error("session already exists: {0}")]
	UniquenessViolation(String),

	/// An event referenced a session that does not exist
	#[error("no session to attach event to: {0}")]
	ReferentialIntegrityViolation(String),

	/// The targeted session does not exist
	#[error("session not found: {0}")]
	NotFound(String),

	/// The database could not be reached
	#[error("storage unavailable: {0}")]
	StorageUnavailable(#[source] sqlx::Error),

	/// Any other database error
	#[error("database error: {0}")]
	Database(#[source] sqlx::Error),

	/// Invalid database URL or pool settings
	#[error("invalid storage configuration: {0}")]
	Configuration(String),

	/// A stored row could not be decoded
	#[error("invalid session data: {0}")]
	InvalidData(String),

	/// A caller-supplied timestamp cannot be stored in sortable form
	#[error("timestamp out of range: {0}")]
	InvalidTimestamp(String),

	/// JSON serialization error
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Core error
	#[error("sessions core error: {0}")]
	Core(#[from] relay_sessions_core::SessionsError),
}

impl From<sqlx::Error> for SessionStoreError {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::Io(_)
			| sqlx::Error::Tls(_)
			| sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::WorkerCrashed => SessionStoreError::StorageUnavailable(err),
			other => SessionStoreError::Database(other),
		}
	}
}

impl SessionStoreError {
	/// Whether a caller may reasonably retry the same request later.
	#[must_use]
	pub fn is_unavailable(&self) -> bool {
		matches!(self, SessionStoreError::StorageUnavailable(_))
	}
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionStoreError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pool_errors_are_unavailable() {
		let err: SessionStoreError = sqlx::Error::PoolTimedOut.into();
		assert!(err.is_unavailable());

		let err: SessionStoreError = sqlx::Error::PoolClosed.into();
		assert!(matches!(err, SessionStoreError::StorageUnavailable(_)));

		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err: SessionStoreError = sqlx::Error::Io(io).into();
		assert!(err.is_unavailable());
	}

	#[test]
	fn test_other_errors_are_database() {
		let err: SessionStoreError = sqlx::Error::RowNotFound.into();
		assert!(matches!(err, SessionStoreError::Database(_)));
		assert!(!err.is_unavailable());
	}

	#[test]
	fn test_display() {
		let err = SessionStoreError::UniquenessViolation("abc".to_string());
		assert_eq!(err.to_string(), "session already exists: abc");

		let err = SessionStoreError::NotFound("abc".to_string());
		assert_eq!(err.to_string(), "session not found: abc");
	}
}
