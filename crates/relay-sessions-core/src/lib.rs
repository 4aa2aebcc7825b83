// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Relay session store.
//!
//! A session is one conversation lifespan for a user; it owns an append-only
//! log of [`SessionEvent`]s. This crate holds the domain types shared by the
//! storage layer and the CLI, plus pure analytics computed from stored rows
//! (statistics, insights, per-user patterns). It performs no I/O.

pub mod error;
pub mod event;
pub mod insights;
pub mod session;
pub mod stats;

pub use error::SessionsError;
pub use event::{
	ConversationRole, ConversationTurn, EventType, NewSessionEvent, SessionEvent, SessionWithEvents,
};
pub use insights::{
	describe_event, format_duration, format_transcript, EngagementMetrics, SessionInsights,
	TimelineEntry, UserSessionPatterns,
};
pub use session::{Session, SessionId, SessionStatus, SessionUpdate};
pub use stats::{EventCounts, RecentSessionSummary, SessionStatistics, SessionWithStats};
