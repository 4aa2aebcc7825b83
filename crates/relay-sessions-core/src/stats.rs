// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event count rollups attached to sessions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::{EventType, SessionEvent};
use crate::session::Session;

/// Event totals for one session, broken out by the three tracked categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
	pub total_events: u64,
	pub user_messages: u64,
	pub assistant_responses: u64,
	pub function_calls: u64,
}

/// Row of the `active_sessions_with_stats` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithStats {
	#[serde(flatten)]
	pub session: Session,
	#[serde(flatten)]
	pub counts: EventCounts,
}

/// Row of the `recent_sessions_summary` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSessionSummary {
	#[serde(flatten)]
	pub session: Session,
	pub event_count: u64,
}

/// Per-session event statistics, including a count for every event type seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
	pub total_events: u64,
	pub user_messages: u64,
	pub assistant_responses: u64,
	pub function_calls: u64,
	pub event_types: BTreeMap<String, u64>,
}

impl SessionStatistics {
	/// Build statistics from `(event_type, count)` pairs, e.g. a `GROUP BY` result.
	pub fn from_type_counts<I, S>(counts: I) -> Self
	where
		I: IntoIterator<Item = (S, u64)>,
		S: Into<String>,
	{
		let mut stats = Self::default();
		for (event_type, count) in counts {
			let event_type: String = event_type.into();
			match EventType::from(event_type.as_str()) {
				EventType::UserMessage => stats.user_messages += count,
				EventType::AssistantResponse => stats.assistant_responses += count,
				EventType::FunctionCall => stats.function_calls += count,
				_ => {}
			}
			stats.total_events += count;
			*stats.event_types.entry(event_type).or_insert(0) += count;
		}
		stats
	}

	/// Build statistics from already loaded events.
	#[must_use]
	pub fn from_events(events: &[SessionEvent]) -> Self {
		Self::from_type_counts(events.iter().map(|e| (e.event_type.to_string(), 1)))
	}
}
