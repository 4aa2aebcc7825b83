// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-session analytics computed from stored sessions and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{ConversationTurn, EventType, SessionEvent};
use crate::session::{Session, SessionId};
use crate::stats::SessionStatistics;

/// Maximum characters of message content kept in a timeline description.
const DESCRIPTION_CONTENT_CHARS: usize = 50;

/// One entry of a session timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
	pub timestamp: DateTime<Utc>,
	pub event_type: EventType,
	pub description: String,
}

/// How engaged the conversation was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
	/// Mean seconds between a user message and the assistant response that
	/// immediately follows it; zero when no such pair exists
	pub average_response_time_seconds: f64,
	/// Number of user messages
	pub total_interactions: u64,
	/// Number of function calls
	pub tools_utilized: u64,
}

/// Detailed report for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInsights {
	pub session_id: SessionId,
	pub summary: Option<String>,
	pub statistics: SessionStatistics,
	pub timeline: Vec<TimelineEntry>,
	pub engagement: EngagementMetrics,
}

impl SessionInsights {
	/// Build the report. `events` must be in ascending timestamp order.
	#[must_use]
	pub fn build(session: &Session, events: &[SessionEvent], statistics: SessionStatistics) -> Self {
		let timeline = events
			.iter()
			.map(|event| TimelineEntry {
				timestamp: event.timestamp,
				event_type: event.event_type.clone(),
				description: describe_event(event),
			})
			.collect();

		let response_times: Vec<f64> = events
			.windows(2)
			.filter(|pair| {
				pair[0].event_type == EventType::UserMessage
					&& pair[1].event_type == EventType::AssistantResponse
			})
			.map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0)
			.collect();

		let average_response_time_seconds = if response_times.is_empty() {
			0.0
		} else {
			response_times.iter().sum::<f64>() / response_times.len() as f64
		};

		let engagement = EngagementMetrics {
			average_response_time_seconds,
			total_interactions: statistics.user_messages,
			tools_utilized: statistics.function_calls,
		};

		Self {
			session_id: session.session_id.clone(),
			summary: session.summary.clone(),
			statistics,
			timeline,
			engagement,
		}
	}
}

/// Usage patterns across a user's most recent sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSessionPatterns {
	pub user_id: String,
	pub sessions_analyzed: u64,
	pub total_duration_seconds: i64,
	pub average_duration_seconds: f64,
	pub average_user_messages: f64,
	pub average_assistant_responses: f64,
	pub total_function_calls: u64,
	pub most_recent_session: SessionId,
}

impl UserSessionPatterns {
	/// Aggregate patterns over `sessions`, newest first, paired index-wise with
	/// their statistics.
	///
	/// Returns `None` when there are no sessions. Sessions that never recorded a
	/// duration count as zero seconds.
	#[must_use]
	pub fn calculate(
		user_id: &str,
		sessions: &[Session],
		statistics: &[SessionStatistics],
	) -> Option<Self> {
		let most_recent = sessions.first()?;
		let session_count = sessions.len() as f64;

		let total_duration_seconds: i64 = sessions
			.iter()
			.map(|s| s.duration_seconds.unwrap_or(0))
			.sum();

		let stats_count = statistics.len().max(1) as f64;
		let user_messages: u64 = statistics.iter().map(|s| s.user_messages).sum();
		let assistant_responses: u64 = statistics.iter().map(|s| s.assistant_responses).sum();
		let total_function_calls: u64 = statistics.iter().map(|s| s.function_calls).sum();

		Some(Self {
			user_id: user_id.to_string(),
			sessions_analyzed: sessions.len() as u64,
			total_duration_seconds,
			average_duration_seconds: total_duration_seconds as f64 / session_count,
			average_user_messages: user_messages as f64 / stats_count,
			average_assistant_responses: assistant_responses as f64 / stats_count,
			total_function_calls,
			most_recent_session: most_recent.session_id.clone(),
		})
	}
}

/// Render a duration the way session reports show it.
///
/// Under a minute: `"N seconds"`; under an hour: `"M minutes, S seconds"`;
/// otherwise `"H hours, M minutes"`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
	if seconds < 60 {
		format!("{seconds} seconds")
	} else if seconds < 3600 {
		format!("{} minutes, {} seconds", seconds / 60, seconds % 60)
	} else {
		format!("{} hours, {} minutes", seconds / 3600, (seconds % 3600) / 60)
	}
}

/// One-line description of an event for timelines.
#[must_use]
pub fn describe_event(event: &SessionEvent) -> String {
	match &event.event_type {
		EventType::UserMessage => format!("User: {}", truncate(event.content().unwrap_or_default())),
		EventType::AssistantResponse => {
			format!("Assistant: {}", truncate(event.content().unwrap_or_default()))
		}
		EventType::FunctionCall => format!("Called function: {}", function_name(event)),
		EventType::FunctionResult => format!("Function {} completed", function_name(event)),
		other => format!("Event: {other}"),
	}
}

/// Render a conversation as `[timestamp] ROLE: content` lines.
#[must_use]
pub fn format_transcript(turns: &[ConversationTurn]) -> String {
	turns
		.iter()
		.map(|turn| {
			format!(
				"[{}] {}: {}",
				turn.timestamp.to_rfc3339(),
				turn.role.to_string().to_uppercase(),
				turn.content
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

fn function_name(event: &SessionEvent) -> &str {
	event
		.data
		.get("function_name")
		.and_then(serde_json::Value::as_str)
		.unwrap_or("unknown")
}

fn truncate(content: &str) -> String {
	if content.chars().count() > DESCRIPTION_CONTENT_CHARS {
		let head: String = content.chars().take(DESCRIPTION_CONTENT_CHARS).collect();
		format!("{head}...")
	} else {
		content.to_string()
	}
}
