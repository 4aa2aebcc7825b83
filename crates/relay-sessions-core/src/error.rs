// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the sessions core.

use thiserror::Error;

/// Errors raised while constructing or parsing session domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionsError {
	/// Invalid session status string
	#[error("invalid session status: {0}")]
	InvalidStatus(String),

	/// Invalid session ID
	#[error("invalid session ID: {0}")]
	InvalidSessionId(String),

	/// Blank user ID
	#[error("invalid user ID: {0:?}")]
	InvalidUserId(String),
}
