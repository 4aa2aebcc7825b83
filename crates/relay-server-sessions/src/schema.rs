// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database schema for sessions and session events.
//!
//! All statements are idempotent, so [`run_migrations`] can run on every
//! startup.

use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::Result;

const CREATE_SESSIONS: &str = r#"
	CREATE TABLE IF NOT EXISTS sessions (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		session_id TEXT NOT NULL UNIQUE,
		user_id TEXT NOT NULL,
		start_time TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')),
		end_time TEXT,
		duration_seconds INTEGER,
		summary TEXT,
		status TEXT DEFAULT 'active',
		created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')),
		updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))
	)
"#;

const CREATE_SESSION_EVENTS: &str = r#"
	CREATE TABLE IF NOT EXISTS session_events (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
		event_type TEXT NOT NULL,
		timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')),
		data TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(data)),
		metadata TEXT DEFAULT '{}' CHECK (metadata IS NULL OR json_valid(metadata)),
		created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))
	)
"#;

const CREATE_INDEXES: [&str; 7] = [
	"CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)",
	"CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status)",
	"CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time DESC)",
	"CREATE INDEX IF NOT EXISTS idx_sessions_end_time ON sessions(end_time)",
	"CREATE INDEX IF NOT EXISTS idx_session_events_session_id ON session_events(session_id)",
	"CREATE INDEX IF NOT EXISTS idx_session_events_timestamp ON session_events(timestamp)",
	"CREATE INDEX IF NOT EXISTS idx_session_events_event_type ON session_events(event_type)",
];

// Fires only when the statement left updated_at alone; recursive triggers are
// off, so the inner UPDATE does not re-enter.
const CREATE_UPDATED_AT_TRIGGER: &str = r#"
	CREATE TRIGGER IF NOT EXISTS sessions_updated_at
	AFTER UPDATE ON sessions
	FOR EACH ROW
	WHEN NEW.updated_at = OLD.updated_at
	BEGIN
		UPDATE sessions
		SET updated_at = strftime('%Y-%m-%dT%H:%M:%f000Z', 'now')
		WHERE id = NEW.id;
	END
"#;

const CREATE_ACTIVE_SESSIONS_VIEW: &str = r#"
	CREATE VIEW IF NOT EXISTS active_sessions_with_stats AS
	SELECT
		s.id, s.session_id, s.user_id,
		s.start_time, s.end_time, s.duration_seconds,
		s.summary, s.status,
		s.created_at, s.updated_at,
		COUNT(e.id) AS total_events,
		COUNT(CASE WHEN e.event_type = 'user_message' THEN 1 END) AS user_messages,
		COUNT(CASE WHEN e.event_type = 'assistant_response' THEN 1 END) AS assistant_responses,
		COUNT(CASE WHEN e.event_type = 'function_call' THEN 1 END) AS function_calls
	FROM sessions s
	LEFT JOIN session_events e ON e.session_id = s.session_id
	WHERE s.status = 'active'
	GROUP BY s.id
"#;

const CREATE_RECENT_SESSIONS_VIEW: &str = r#"
	CREATE VIEW IF NOT EXISTS recent_sessions_summary AS
	SELECT
		s.id, s.session_id, s.user_id,
		s.start_time, s.end_time, s.duration_seconds,
		s.summary, s.status,
		s.created_at, s.updated_at,
		COUNT(e.id) AS event_count
	FROM sessions s
	LEFT JOIN session_events e ON e.session_id = s.session_id
	GROUP BY s.id
	ORDER BY s.start_time DESC, s.id DESC
	LIMIT 50
"#;

/// Create tables, indexes, the `updated_at` trigger and the read views.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	let mut tx = pool.begin().await?;

	sqlx::query(CREATE_SESSIONS).execute(&mut *tx).await?;
	sqlx::query(CREATE_SESSION_EVENTS).execute(&mut *tx).await?;
	for statement in CREATE_INDEXES {
		sqlx::query(statement).execute(&mut *tx).await?;
	}
	sqlx::query(CREATE_UPDATED_AT_TRIGGER)
		.execute(&mut *tx)
		.await?;
	sqlx::query(CREATE_ACTIVE_SESSIONS_VIEW)
		.execute(&mut *tx)
		.await?;
	sqlx::query(CREATE_RECENT_SESSIONS_VIEW)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	tracing::debug!("session schema up to date");
	Ok(())
}
