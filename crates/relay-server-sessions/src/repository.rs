// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use relay_sessions_core::{
	ConversationTurn, EventCounts, EventType, NewSessionEvent, RecentSessionSummary, Session,
	SessionEvent, SessionId, SessionInsights, SessionStatistics, SessionStatus, SessionUpdate,
	SessionWithEvents, SessionWithStats, SessionsError, UserSessionPatterns,
};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::QueryBuilder;
use tracing::instrument;

use crate::error::{Result, SessionStoreError};
use crate::time;

/// Maximum number of rows exposed by `recent_sessions_summary`.
pub const RECENT_SESSIONS_LIMIT: usize = 50;

/// Repository trait for session and event persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Start a new active session.
	async fn create_session(&self, session_id: &SessionId, user_id: &str) -> Result<Session>;

	async fn get_session(&self, session_id: &SessionId) -> Result<Session>;

	/// Apply a partial update. Fields left as `None` keep their stored value.
	async fn update_session(&self, session_id: &SessionId, update: &SessionUpdate)
		-> Result<Session>;

	/// Mark a session completed, stamping its end time and duration.
	async fn close_session(&self, session_id: &SessionId) -> Result<Session>;

	/// Delete a session and, by cascade, its events. Returns whether it existed.
	async fn delete_session(&self, session_id: &SessionId) -> Result<bool>;

	async fn append_event(&self, event: &NewSessionEvent) -> Result<SessionEvent>;

	/// Events of a session in ascending timestamp order, optionally limited to
	/// some event types. An empty filter selects every type.
	async fn get_session_events(
		&self,
		session_id: &SessionId,
		event_types: Option<&[EventType]>,
	) -> Result<Vec<SessionEvent>>;

	async fn get_session_with_events(&self, session_id: &SessionId) -> Result<SessionWithEvents>;

	async fn list_active_sessions_with_stats(&self) -> Result<Vec<SessionWithStats>>;

	/// At most [`RECENT_SESSIONS_LIMIT`] sessions, newest start first.
	async fn list_recent_sessions_summary(&self) -> Result<Vec<RecentSessionSummary>>;

	async fn list_recent_sessions_for_user(&self, user_id: &str, limit: u32)
		-> Result<Vec<Session>>;

	async fn get_session_statistics(&self, session_id: &SessionId) -> Result<SessionStatistics>;

	/// Delete every ended session whose end time is before `cutoff`.
	async fn purge_sessions_ended_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

	/// Delete every session that ended more than `days_old` days ago.
	/// Open sessions are never purged.
	async fn purge_old_sessions(&self, days_old: u32) -> Result<u64> {
		let Some(cutoff) = Utc::now().checked_sub_signed(Duration::days(i64::from(days_old)))
		else {
			tracing::debug!(days_old, "retention window reaches past the earliest time");
			return Ok(0);
		};
		self.purge_sessions_ended_before(cutoff).await
	}

	async fn summarize_session(&self, session_id: &SessionId, summary: &str) -> Result<Session> {
		self.update_session(session_id, &SessionUpdate::summarized(summary))
			.await
	}

	/// User messages and assistant responses in order.
	async fn get_conversation_history(
		&self,
		session_id: &SessionId,
	) -> Result<Vec<ConversationTurn>> {
		let events = self
			.get_session_events(
				session_id,
				Some(&[EventType::UserMessage, EventType::AssistantResponse]),
			)
			.await?;
		Ok(events.iter().filter_map(ConversationTurn::from_event).collect())
	}

	async fn get_session_insights(&self, session_id: &SessionId) -> Result<SessionInsights> {
		let SessionWithEvents { session, events } = self.get_session_with_events(session_id).await?;
		let statistics = SessionStatistics::from_events(&events);
		Ok(SessionInsights::build(&session, &events, statistics))
	}

	/// Patterns across the user's `limit` most recent sessions, or `None` if
	/// the user has no sessions.
	async fn get_user_session_patterns(
		&self,
		user_id: &str,
		limit: u32,
	) -> Result<Option<UserSessionPatterns>> {
		let sessions = self.list_recent_sessions_for_user(user_id, limit).await?;
		let mut statistics = Vec::with_capacity(sessions.len());
		for session in &sessions {
			statistics.push(self.get_session_statistics(&session.session_id).await?);
		}
		Ok(UserSessionPatterns::calculate(
			user_id,
			&sessions,
			&statistics,
		))
	}
}

/// SQLite implementation of the session repository.
#[derive(Clone)]
pub struct SqliteSessionStore {
	pool: SqlitePool,
}

impl SqliteSessionStore {
	/// Create a new repository with the given pool.
	///
	/// The schema must already exist; see [`crate::run_migrations`].
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

#[derive(sqlx::FromRow)]
struct SessionRow {
	id: i64,
	session_id: String,
	user_id: String,
	start_time: String,
	end_time: Option<String>,
	duration_seconds: Option<i64>,
	summary: Option<String>,
	status: Option<String>,
	created_at: String,
	updated_at: String,
}

impl TryFrom<SessionRow> for Session {
	type Error = SessionStoreError;

	fn try_from(row: SessionRow) -> Result<Self> {
		let session_id = SessionId::new(row.session_id)
			.map_err(|e| SessionStoreError::InvalidData(e.to_string()))?;
		// A NULL status reads as the column default.
		let status = row
			.status
			.as_deref()
			.map(str::parse::<SessionStatus>)
			.transpose()
			.map_err(|e| SessionStoreError::InvalidData(e.to_string()))?
			.unwrap_or_default();

		Ok(Session {
			id: row.id,
			session_id,
			user_id: row.user_id,
			start_time: time::decode("start_time", &row.start_time)?,
			end_time: time::decode_opt("end_time", row.end_time)?,
			duration_seconds: row.duration_seconds,
			summary: row.summary,
			status,
			created_at: time::decode("created_at", &row.created_at)?,
			updated_at: time::decode("updated_at", &row.updated_at)?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct EventRow {
	id: i64,
	session_id: String,
	event_type: String,
	timestamp: String,
	data: String,
	metadata: Option<String>,
	created_at: String,
}

impl TryFrom<EventRow> for SessionEvent {
	type Error = SessionStoreError;

	fn try_from(row: EventRow) -> Result<Self> {
		let session_id = SessionId::new(row.session_id)
			.map_err(|e| SessionStoreError::InvalidData(e.to_string()))?;
		let metadata = row
			.metadata
			.as_deref()
			.map(serde_json::from_str)
			.transpose()?;

		Ok(SessionEvent {
			id: row.id,
			session_id,
			event_type: EventType::from(row.event_type),
			timestamp: time::decode("timestamp", &row.timestamp)?,
			data: serde_json::from_str(&row.data)?,
			metadata,
			created_at: time::decode("created_at", &row.created_at)?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct ActiveSessionRow {
	#[sqlx(flatten)]
	session: SessionRow,
	total_events: i64,
	user_messages: i64,
	assistant_responses: i64,
	function_calls: i64,
}

impl TryFrom<ActiveSessionRow> for SessionWithStats {
	type Error = SessionStoreError;

	fn try_from(row: ActiveSessionRow) -> Result<Self> {
		Ok(SessionWithStats {
			session: row.session.try_into()?,
			counts: EventCounts {
				total_events: count(row.total_events),
				user_messages: count(row.user_messages),
				assistant_responses: count(row.assistant_responses),
				function_calls: count(row.function_calls),
			},
		})
	}
}

#[derive(sqlx::FromRow)]
struct RecentSessionRow {
	#[sqlx(flatten)]
	session: SessionRow,
	event_count: i64,
}

impl TryFrom<RecentSessionRow> for RecentSessionSummary {
	type Error = SessionStoreError;

	fn try_from(row: RecentSessionRow) -> Result<Self> {
		Ok(RecentSessionSummary {
			session: row.session.try_into()?,
			event_count: count(row.event_count),
		})
	}
}

fn count(raw: i64) -> u64 {
	u64::try_from(raw).unwrap_or(0)
}

async fn fetch_session(
	conn: &mut SqliteConnection,
	session_id: &SessionId,
) -> Result<Option<Session>> {
	let row: Option<SessionRow> = sqlx::query_as(
		r#"
		SELECT id, session_id, user_id, start_time, end_time, duration_seconds,
		       summary, status, created_at, updated_at
		FROM sessions
		WHERE session_id = ?
		"#,
	)
	.bind(session_id.as_str())
	.fetch_optional(&mut *conn)
	.await?;

	row.map(Session::try_from).transpose()
}

/// Write `update` and bump `updated_at`. Returns the stored row, or `None` if
/// no such session exists.
async fn apply_update(
	conn: &mut SqliteConnection,
	session_id: &SessionId,
	update: &SessionUpdate,
) -> Result<Option<Session>> {
	let end_time = update
		.end_time
		.map(|ts| time::check("end_time", ts))
		.transpose()?;

	let result = sqlx::query(
		r#"
		UPDATE sessions
		SET end_time = COALESCE(?, end_time),
		    duration_seconds = COALESCE(?, duration_seconds),
		    summary = COALESCE(?, summary),
		    status = COALESCE(?, status),
		    updated_at = ?
		WHERE session_id = ?
		"#,
	)
	.bind(end_time.as_ref().map(time::encode))
	.bind(update.duration_seconds)
	.bind(update.summary.as_deref())
	.bind(update.status.map(|s| s.as_str()))
	.bind(time::encode(&time::now()))
	.bind(session_id.as_str())
	.execute(&mut *conn)
	.await?;

	if result.rows_affected() == 0 {
		return Ok(None);
	}

	fetch_session(conn, session_id).await
}

fn not_found(session_id: &SessionId) -> SessionStoreError {
	SessionStoreError::NotFound(session_id.to_string())
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn create_session(&self, session_id: &SessionId, user_id: &str) -> Result<Session> {
		if user_id.trim().is_empty() {
			return Err(SessionsError::InvalidUserId(user_id.to_string()).into());
		}

		let now = time::now();
		let now_str = time::encode(&now);
		let status = SessionStatus::Active;

		let result = sqlx::query(
			r#"
			INSERT INTO sessions (session_id, user_id, start_time, status, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(session_id.as_str())
		.bind(user_id)
		.bind(&now_str)
		.bind(status.as_str())
		.bind(&now_str)
		.bind(&now_str)
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				SessionStoreError::UniquenessViolation(session_id.to_string())
			}
			other => other.into(),
		})?;

		tracing::info!(user_id, "session created");

		Ok(Session {
			id: result.last_insert_rowid(),
			session_id: session_id.clone(),
			user_id: user_id.to_string(),
			start_time: now,
			end_time: None,
			duration_seconds: None,
			summary: None,
			status,
			created_at: now,
			updated_at: now,
		})
	}

	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn get_session(&self, session_id: &SessionId) -> Result<Session> {
		let mut conn = self.pool.acquire().await?;
		fetch_session(&mut conn, session_id)
			.await?
			.ok_or_else(|| not_found(session_id))
	}

	#[instrument(skip(self, update), fields(session_id = %session_id))]
	async fn update_session(
		&self,
		session_id: &SessionId,
		update: &SessionUpdate,
	) -> Result<Session> {
		let mut tx = self.pool.begin().await?;
		let session = apply_update(&mut tx, session_id, update)
			.await?
			.ok_or_else(|| not_found(session_id))?;
		tx.commit().await?;

		tracing::debug!(status = %session.status, "session updated");
		Ok(session)
	}

	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn close_session(&self, session_id: &SessionId) -> Result<Session> {
		let mut tx = self.pool.begin().await?;

		let current = fetch_session(&mut tx, session_id)
			.await?
			.ok_or_else(|| not_found(session_id))?;
		let end_time = time::now();
		let update = SessionUpdate::completed(end_time, current.elapsed_seconds(end_time));

		let session = apply_update(&mut tx, session_id, &update)
			.await?
			.ok_or_else(|| not_found(session_id))?;
		tx.commit().await?;

		tracing::info!(
			duration_seconds = session.duration_seconds,
			"session closed"
		);
		Ok(session)
	}

	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn delete_session(&self, session_id: &SessionId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
			.bind(session_id.as_str())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::info!("session deleted");
		}
		Ok(deleted)
	}

	#[instrument(skip(self, event), fields(session_id = %event.session_id, event_type = %event.event_type))]
	async fn append_event(&self, event: &NewSessionEvent) -> Result<SessionEvent> {
		let timestamp = match event.timestamp {
			Some(ts) => time::truncate(time::check("timestamp", ts)?),
			None => time::now(),
		};
		let created_at = time::now();
		let metadata = event.metadata_or_empty();

		let result = sqlx::query(
			r#"
			INSERT INTO session_events (session_id, event_type, timestamp, data, metadata, created_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.session_id.as_str())
		.bind(event.event_type.as_str())
		.bind(time::encode(&timestamp))
		.bind(serde_json::to_string(&event.data)?)
		.bind(serde_json::to_string(&metadata)?)
		.bind(time::encode(&created_at))
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
				SessionStoreError::ReferentialIntegrityViolation(event.session_id.to_string())
			}
			other => other.into(),
		})?;

		tracing::debug!("event appended");

		Ok(SessionEvent {
			id: result.last_insert_rowid(),
			session_id: event.session_id.clone(),
			event_type: event.event_type.clone(),
			timestamp,
			data: event.data.clone(),
			metadata: Some(metadata),
			created_at,
		})
	}

	#[instrument(skip(self, event_types), fields(session_id = %session_id))]
	async fn get_session_events(
		&self,
		session_id: &SessionId,
		event_types: Option<&[EventType]>,
	) -> Result<Vec<SessionEvent>> {
		let mut query = QueryBuilder::<Sqlite>::new(
			"SELECT id, session_id, event_type, timestamp, data, metadata, created_at \
			 FROM session_events WHERE session_id = ",
		);
		query.push_bind(session_id.as_str());

		if let Some(types) = event_types.filter(|types| !types.is_empty()) {
			query.push(" AND event_type IN (");
			let mut separated = query.separated(", ");
			for event_type in types {
				separated.push_bind(event_type.as_str());
			}
			separated.push_unseparated(")");
		}
		query.push(" ORDER BY timestamp ASC, id ASC");

		let rows: Vec<EventRow> = query.build_query_as().fetch_all(&self.pool).await?;
		rows.into_iter().map(SessionEvent::try_from).collect()
	}

	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn get_session_with_events(&self, session_id: &SessionId) -> Result<SessionWithEvents> {
		let session = self.get_session(session_id).await?;
		let events = self.get_session_events(session_id, None).await?;
		Ok(SessionWithEvents { session, events })
	}

	#[instrument(skip(self))]
	async fn list_active_sessions_with_stats(&self) -> Result<Vec<SessionWithStats>> {
		let rows: Vec<ActiveSessionRow> = sqlx::query_as(
			r#"
			SELECT id, session_id, user_id, start_time, end_time, duration_seconds,
			       summary, status, created_at, updated_at,
			       total_events, user_messages, assistant_responses, function_calls
			FROM active_sessions_with_stats
			ORDER BY start_time DESC, id DESC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(SessionWithStats::try_from).collect()
	}

	#[instrument(skip(self))]
	async fn list_recent_sessions_summary(&self) -> Result<Vec<RecentSessionSummary>> {
		let rows: Vec<RecentSessionRow> = sqlx::query_as(
			r#"
			SELECT id, session_id, user_id, start_time, end_time, duration_seconds,
			       summary, status, created_at, updated_at, event_count
			FROM recent_sessions_summary
			ORDER BY start_time DESC, id DESC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(RecentSessionSummary::try_from).collect()
	}

	#[instrument(skip(self))]
	async fn list_recent_sessions_for_user(
		&self,
		user_id: &str,
		limit: u32,
	) -> Result<Vec<Session>> {
		let rows: Vec<SessionRow> = sqlx::query_as(
			r#"
			SELECT id, session_id, user_id, start_time, end_time, duration_seconds,
			       summary, status, created_at, updated_at
			FROM sessions
			WHERE user_id = ?
			ORDER BY start_time DESC, id DESC
			LIMIT ?
			"#,
		)
		.bind(user_id)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(Session::try_from).collect()
	}

	#[instrument(skip(self), fields(session_id = %session_id))]
	async fn get_session_statistics(&self, session_id: &SessionId) -> Result<SessionStatistics> {
		let rows: Vec<(String, i64)> = sqlx::query_as(
			r#"
			SELECT event_type, COUNT(*)
			FROM session_events
			WHERE session_id = ?
			GROUP BY event_type
			"#,
		)
		.bind(session_id.as_str())
		.fetch_all(&self.pool)
		.await?;

		Ok(SessionStatistics::from_type_counts(
			rows.into_iter().map(|(event_type, n)| (event_type, count(n))),
		))
	}

	#[instrument(skip(self), fields(cutoff = %cutoff))]
	async fn purge_sessions_ended_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		// Stored end times all lie within the storable years.
		let result = if time::is_storable(&cutoff) {
			sqlx::query("DELETE FROM sessions WHERE end_time IS NOT NULL AND end_time < ?")
				.bind(time::encode(&cutoff))
				.execute(&self.pool)
				.await?
		} else if cutoff.year() < 1 {
			return Ok(0);
		} else {
			sqlx::query("DELETE FROM sessions WHERE end_time IS NOT NULL")
				.execute(&self.pool)
				.await?
		};

		let purged = result.rows_affected();
		tracing::info!(purged, "purged old sessions");
		Ok(purged)
	}
}
