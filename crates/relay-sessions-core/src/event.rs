// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{Session, SessionId};

/// Category of a session event.
///
/// The set is open: anything outside the known categories round-trips through
/// [`EventType::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
	UserMessage,
	AssistantResponse,
	FunctionCall,
	FunctionResult,
	SessionStart,
	SessionEnd,
	Other(String),
}

impl EventType {
	#[must_use]
	pub fn as_str(&self) -> &str {
		match self {
			EventType::UserMessage => "user_message",
			EventType::AssistantResponse => "assistant_response",
			EventType::FunctionCall => "function_call",
			EventType::FunctionResult => "function_result",
			EventType::SessionStart => "session_start",
			EventType::SessionEnd => "session_end",
			EventType::Other(s) => s,
		}
	}
}

impl std::fmt::Display for EventType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for EventType {
	fn from(s: &str) -> Self {
		match s {
			"user_message" => EventType::UserMessage,
			"assistant_response" => EventType::AssistantResponse,
			"function_call" => EventType::FunctionCall,
			"function_result" => EventType::FunctionResult,
			"session_start" => EventType::SessionStart,
			"session_end" => EventType::SessionEnd,
			other => EventType::Other(other.to_string()),
		}
	}
}

impl From<String> for EventType {
	fn from(s: String) -> Self {
		EventType::from(s.as_str())
	}
}

impl From<EventType> for String {
	fn from(event_type: EventType) -> Self {
		match event_type {
			EventType::Other(s) => s,
			known => known.as_str().to_string(),
		}
	}
}

impl std::str::FromStr for EventType {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(EventType::from(s))
	}
}

/// A stored, immutable occurrence within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
	/// Internal sequential surrogate key
	pub id: i64,
	pub session_id: SessionId,
	pub event_type: EventType,
	pub timestamp: DateTime<Utc>,
	/// Event payload; any valid JSON document
	pub data: Value,
	pub metadata: Option<Value>,
	pub created_at: DateTime<Utc>,
}

impl SessionEvent {
	/// The `content` string of the payload, if present.
	#[must_use]
	pub fn content(&self) -> Option<&str> {
		self.data.get("content").and_then(Value::as_str)
	}
}

/// A session together with its events in ascending timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithEvents {
	#[serde(flatten)]
	pub session: Session,
	pub events: Vec<SessionEvent>,
}

/// An event to be appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSessionEvent {
	pub session_id: SessionId,
	pub event_type: EventType,
	#[serde(default = "empty_document")]
	pub data: Value,
	#[serde(default)]
	pub metadata: Option<Value>,
	/// Defaults to the time of insertion when absent
	#[serde(default)]
	pub timestamp: Option<DateTime<Utc>>,
}

fn empty_document() -> Value {
	Value::Object(serde_json::Map::new())
}

impl NewSessionEvent {
	pub fn new(session_id: SessionId, event_type: impl Into<EventType>, data: Value) -> Self {
		Self {
			session_id,
			event_type: event_type.into(),
			data,
			metadata: None,
			timestamp: None,
		}
	}

	#[must_use]
	pub fn with_metadata(mut self, metadata: Value) -> Self {
		self.metadata = Some(metadata);
		self
	}

	#[must_use]
	pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Metadata as it will be persisted: an empty document when none was given.
	#[must_use]
	pub fn metadata_or_empty(&self) -> Value {
		self.metadata.clone().unwrap_or_else(empty_document)
	}
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
	User,
	Assistant,
}

impl std::fmt::Display for ConversationRole {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConversationRole::User => write!(f, "user"),
			ConversationRole::Assistant => write!(f, "assistant"),
		}
	}
}

/// One message of the conversation reconstructed from the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
	pub role: ConversationRole,
	pub content: String,
	pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
	/// Build a turn from a user message or assistant response event.
	///
	/// Returns `None` for any other event type. A payload without a string
	/// `content` field yields an empty message.
	#[must_use]
	pub fn from_event(event: &SessionEvent) -> Option<Self> {
		let role = match event.event_type {
			EventType::UserMessage => ConversationRole::User,
			EventType::AssistantResponse => ConversationRole::Assistant,
			_ => return None,
		};

		Some(Self {
			role,
			content: event.content().unwrap_or_default().to_string(),
			timestamp: event.timestamp,
		})
	}
}
