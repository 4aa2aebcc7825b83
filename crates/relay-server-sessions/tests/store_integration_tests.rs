// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end session lifecycle against a file-backed database.

use chrono::{Duration, Utc};
use relay_server_sessions::{
	create_pool, run_migrations, SessionStore, SessionStoreError, SqliteSessionStore,
};
use relay_sessions_core::{EventType, NewSessionEvent, SessionId, SessionStatus, SessionUpdate};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqliteSessionStore) {
	let dir = tempfile::tempdir().unwrap();
	let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
	let pool = create_pool(&url).await.unwrap();
	run_migrations(&pool).await.unwrap();
	(dir, SqliteSessionStore::new(pool))
}

#[tokio::test]
async fn test_full_session_lifecycle() {
	let (_dir, store) = setup().await;
	let id = SessionId::generate();

	store.create_session(&id, "user-42").await.unwrap();
	for (event_type, data) in [
		(EventType::SessionStart, json!({})),
		(EventType::UserMessage, json!({"content": "book a table"})),
		(EventType::FunctionCall, json!({"name": "reserve", "args": {"party": 2}})),
		(EventType::FunctionResult, json!({"ok": true})),
		(EventType::AssistantResponse, json!({"content": "Done, 7pm."})),
	] {
		store
			.append_event(
				&NewSessionEvent::new(id.clone(), event_type, data)
					.with_metadata(json!({"client": "ios"})),
			)
			.await
			.unwrap();
	}

	let active = store.list_active_sessions_with_stats().await.unwrap();
	assert_eq!(active.len(), 1);
	assert_eq!(active[0].counts.total_events, 5);
	assert_eq!(active[0].counts.function_calls, 1);

	let closed = store.close_session(&id).await.unwrap();
	assert_eq!(closed.status, SessionStatus::Completed);
	assert!(store.list_active_sessions_with_stats().await.unwrap().is_empty());

	let summarized = store
		.summarize_session(&id, "Reserved a table for two")
		.await
		.unwrap();
	assert_eq!(summarized.status, SessionStatus::Summarized);
	assert_eq!(summarized.end_time, closed.end_time);

	let recent = store.list_recent_sessions_summary().await.unwrap();
	assert_eq!(recent.len(), 1);
	assert_eq!(recent[0].event_count, 5);

	let history = store.get_conversation_history(&id).await.unwrap();
	assert_eq!(history.len(), 2);
	assert_eq!(history[1].content, "Done, 7pm.");

	let detail = store.get_session_with_events(&id).await.unwrap();
	assert_eq!(detail.events[2].data["args"]["party"], 2);
	assert_eq!(detail.events[0].metadata, Some(json!({"client": "ios"})));
}

#[tokio::test]
async fn test_data_survives_reopen() {
	let dir = tempfile::tempdir().unwrap();
	let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
	let id = SessionId::new("persisted").unwrap();

	{
		let pool = create_pool(&url).await.unwrap();
		run_migrations(&pool).await.unwrap();
		let store = SqliteSessionStore::new(pool.clone());
		store.create_session(&id, "u1").await.unwrap();
		store
			.append_event(&NewSessionEvent::new(
				id.clone(),
				"user_message",
				json!({"content": "remember me"}),
			))
			.await
			.unwrap();
		pool.close().await;
	}

	let pool = create_pool(&url).await.unwrap();
	run_migrations(&pool).await.unwrap();
	let store = SqliteSessionStore::new(pool);
	let events = store.get_session_events(&id, None).await.unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].content(), Some("remember me"));
}

#[tokio::test]
async fn test_concurrent_appends_from_many_tasks() {
	let (_dir, store) = setup().await;
	let store = Arc::new(store);
	let id = SessionId::new("busy").unwrap();
	store.create_session(&id, "u1").await.unwrap();

	let mut handles = Vec::new();
	for i in 0..20 {
		let store = Arc::clone(&store);
		let id = id.clone();
		handles.push(tokio::spawn(async move {
			store
				.append_event(&NewSessionEvent::new(
					id,
					EventType::UserMessage,
					json!({"content": format!("message {i}")}),
				))
				.await
		}));
	}
	for handle in handles {
		handle.await.unwrap().unwrap();
	}

	let stats = store.get_session_statistics(&id).await.unwrap();
	assert_eq!(stats.user_messages, 20);
}

#[tokio::test]
async fn test_retention_purge_scenario() {
	let (_dir, store) = setup().await;
	let now = Utc::now();

	let ancient = SessionId::new("ancient").unwrap();
	let recent = SessionId::new("recent").unwrap();
	let ongoing = SessionId::new("ongoing").unwrap();
	for id in [&ancient, &recent, &ongoing] {
		store.create_session(id, "u1").await.unwrap();
		store
			.append_event(&NewSessionEvent::new(id.clone(), "session_start", json!({})))
			.await
			.unwrap();
	}
	store
		.update_session(
			&ancient,
			&SessionUpdate::completed(now - Duration::days(40), 600),
		)
		.await
		.unwrap();
	store
		.update_session(
			&recent,
			&SessionUpdate::completed(now - Duration::days(10), 600),
		)
		.await
		.unwrap();

	assert_eq!(store.purge_old_sessions(30).await.unwrap(), 1);

	let err = store.get_session_with_events(&ancient).await.unwrap_err();
	assert!(matches!(err, SessionStoreError::NotFound(_)));
	assert!(store
		.get_session_events(&ancient, None)
		.await
		.unwrap()
		.is_empty());
	assert_eq!(store.get_session_events(&recent, None).await.unwrap().len(), 1);
	assert!(store.get_session(&ongoing).await.unwrap().is_open());
}
