// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionsError;

/// Caller-supplied unique identifier for a session.
///
/// Any non-blank string is accepted and kept verbatim, surrounding whitespace
/// included, so it always matches the stored `session_id` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
	/// Build a session ID, rejecting blank input.
	pub fn new(id: impl Into<String>) -> Result<Self, SessionsError> {
		let id = id.into();
		if id.trim().is_empty() {
			return Err(SessionsError::InvalidSessionId(id));
		}
		Ok(Self(id))
	}

	/// Generate a fresh, time-ordered session ID.
	#[must_use]
	pub fn generate() -> Self {
		Self(Uuid::now_v7().to_string())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl std::str::FromStr for SessionId {
	type Err = SessionsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl TryFrom<String> for SessionId {
	type Error = SessionsError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<SessionId> for String {
	fn from(id: SessionId) -> Self {
		id.0
	}
}

impl AsRef<str> for SessionId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// One logical conversation lifespan for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	/// Internal sequential surrogate key
	pub id: i64,
	pub session_id: SessionId,
	pub user_id: String,

	pub start_time: DateTime<Utc>,
	pub end_time: Option<DateTime<Utc>>,
	pub duration_seconds: Option<i64>,

	/// Free-text summary, typically written after the session ends
	pub summary: Option<String>,
	pub status: SessionStatus,

	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Session {
	/// A session is open until it has an end time.
	#[must_use]
	pub fn is_open(&self) -> bool {
		self.end_time.is_none()
	}

	/// Whole seconds between `start_time` and `at`, clamped at zero.
	#[must_use]
	pub fn elapsed_seconds(&self, at: DateTime<Utc>) -> i64 {
		(at - self.start_time).num_seconds().max(0)
	}
}

/// Session status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	/// Session is ongoing
	#[default]
	Active,
	/// Session has ended
	Completed,
	/// Session has ended and a summary has been written
	Summarized,
}

impl SessionStatus {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			SessionStatus::Active => "active",
			SessionStatus::Completed => "completed",
			SessionStatus::Summarized => "summarized",
		}
	}
}

impl std::fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for SessionStatus {
	type Err = SessionsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(SessionStatus::Active),
			"completed" => Ok(SessionStatus::Completed),
			"summarized" => Ok(SessionStatus::Summarized),
			_ => Err(SessionsError::InvalidStatus(s.to_string())),
		}
	}
}

/// Partial update of a session. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_time: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duration_seconds: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<SessionStatus>,
}

impl SessionUpdate {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The update applied when a session ends.
	#[must_use]
	pub fn completed(end_time: DateTime<Utc>, duration_seconds: i64) -> Self {
		Self {
			end_time: Some(end_time),
			duration_seconds: Some(duration_seconds),
			status: Some(SessionStatus::Completed),
			..Self::default()
		}
	}

	/// The update applied when a summary is written.
	#[must_use]
	pub fn summarized(summary: impl Into<String>) -> Self {
		Self {
			summary: Some(summary.into()),
			status: Some(SessionStatus::Summarized),
			..Self::default()
		}
	}

	#[must_use]
	pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
		self.end_time = Some(end_time);
		self
	}

	#[must_use]
	pub fn duration_seconds(mut self, duration_seconds: i64) -> Self {
		self.duration_seconds = Some(duration_seconds);
		self
	}

	#[must_use]
	pub fn summary(mut self, summary: impl Into<String>) -> Self {
		self.summary = Some(summary.into());
		self
	}

	#[must_use]
	pub fn status(mut self, status: SessionStatus) -> Self {
		self.status = Some(status);
		self
	}

	/// True when no field would change. Such an update still refreshes `updated_at`.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.end_time.is_none()
			&& self.duration_seconds.is_none()
			&& self.summary.is_none()
			&& self.status.is_none()
	}
}
