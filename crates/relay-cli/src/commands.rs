// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use relay_server_config::ServerConfig;
use relay_server_sessions::SessionStore;
use relay_sessions_core::{
	format_duration, format_transcript, EventType, NewSessionEvent, SessionId, SessionStatus,
	SessionUpdate,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Create or upgrade the schema and exit
	Migrate,

	/// Start a new session
	Create {
		/// Owning user
		#[arg(long)]
		user_id: String,

		/// Session identifier (generated when omitted)
		#[arg(long)]
		session_id: Option<SessionId>,
	},

	/// Append an event to a session
	Append {
		session_id: SessionId,

		/// Event type, e.g. user_message or function_call
		#[arg(long = "type")]
		event_type: EventType,

		/// JSON payload
		#[arg(long, value_parser = parse_json, default_value = "{}")]
		data: Value,

		/// JSON metadata
		#[arg(long, value_parser = parse_json)]
		metadata: Option<Value>,

		/// Event time (RFC 3339, defaults to now)
		#[arg(long)]
		timestamp: Option<DateTime<Utc>>,
	},

	/// Change selected fields of a session
	Update {
		session_id: SessionId,

		#[arg(long)]
		end_time: Option<DateTime<Utc>>,

		#[arg(long)]
		duration_seconds: Option<i64>,

		#[arg(long)]
		summary: Option<String>,

		#[arg(long)]
		status: Option<SessionStatus>,
	},

	/// End a session now
	Close { session_id: SessionId },

	/// Store a summary and mark the session summarized
	Summarize { session_id: SessionId, summary: String },

	/// Show a session, optionally with its events
	Show {
		session_id: SessionId,

		#[arg(long)]
		events: bool,
	},

	/// List a session's events in order
	Events {
		session_id: SessionId,

		/// Only these event types (repeatable)
		#[arg(long = "type")]
		event_types: Vec<EventType>,
	},

	/// Conversation turns of a session
	History {
		session_id: SessionId,

		/// Print a plain-text transcript instead of JSON
		#[arg(long)]
		transcript: bool,
	},

	/// Event counts for a session
	Stats { session_id: SessionId },

	/// Timeline and engagement report for a session
	Insights { session_id: SessionId },

	/// Active sessions with event counts
	Active,

	/// Most recent sessions with event totals
	Recent {
		/// Restrict to one user
		#[arg(long)]
		user_id: Option<String>,

		/// Maximum sessions when filtering by user
		#[arg(long, default_value_t = 10)]
		limit: u32,
	},

	/// Usage patterns across a user's recent sessions
	Patterns {
		user_id: String,

		#[arg(long, default_value_t = 10)]
		limit: u32,
	},

	/// Delete a session and its events
	Delete { session_id: SessionId },

	/// Delete sessions that ended before the retention window
	Purge {
		/// Defaults to the configured retention
		#[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
		days_old: Option<u32>,
	},
}

fn parse_json(raw: &str) -> Result<Value, String> {
	serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

pub async fn run(
	store: &dyn SessionStore,
	config: &ServerConfig,
	command: Command,
) -> anyhow::Result<()> {
	match command {
		Command::Migrate => {
			tracing::info!("schema is up to date");
		}
		Command::Create {
			user_id,
			session_id,
		} => {
			let session_id = session_id.unwrap_or_else(SessionId::generate);
			let session = store.create_session(&session_id, &user_id).await?;
			print_json(&session)?;
		}
		Command::Append {
			session_id,
			event_type,
			data,
			metadata,
			timestamp,
		} => {
			let mut event = NewSessionEvent::new(session_id, event_type, data);
			event.metadata = metadata;
			event.timestamp = timestamp;
			let stored = store.append_event(&event).await?;
			print_json(&stored)?;
		}
		Command::Update {
			session_id,
			end_time,
			duration_seconds,
			summary,
			status,
		} => {
			let update = SessionUpdate {
				end_time,
				duration_seconds,
				summary,
				status,
			};
			if update.is_empty() {
				anyhow::bail!("nothing to update; pass at least one field");
			}
			let session = store.update_session(&session_id, &update).await?;
			print_json(&session)?;
		}
		Command::Close { session_id } => {
			let session = store.close_session(&session_id).await?;
			let duration = session.duration_seconds.unwrap_or(0).max(0) as u64;
			tracing::info!(duration = %format_duration(duration), "session closed");
			print_json(&session)?;
		}
		Command::Summarize {
			session_id,
			summary,
		} => {
			let session = store.summarize_session(&session_id, &summary).await?;
			print_json(&session)?;
		}
		Command::Show { session_id, events } => {
			if events {
				print_json(&store.get_session_with_events(&session_id).await?)?;
			} else {
				print_json(&store.get_session(&session_id).await?)?;
			}
		}
		Command::Events {
			session_id,
			event_types,
		} => {
			let events = store
				.get_session_events(&session_id, Some(event_types.as_slice()))
				.await?;
			print_json(&events)?;
		}
		Command::History {
			session_id,
			transcript,
		} => {
			let turns = store.get_conversation_history(&session_id).await?;
			if transcript {
				println!("{}", format_transcript(&turns));
			} else {
				print_json(&turns)?;
			}
		}
		Command::Stats { session_id } => {
			print_json(&store.get_session_statistics(&session_id).await?)?;
		}
		Command::Insights { session_id } => {
			print_json(&store.get_session_insights(&session_id).await?)?;
		}
		Command::Active => {
			print_json(&store.list_active_sessions_with_stats().await?)?;
		}
		Command::Recent { user_id, limit } => match user_id {
			Some(user_id) => {
				print_json(&store.list_recent_sessions_for_user(&user_id, limit).await?)?
			}
			None => print_json(&store.list_recent_sessions_summary().await?)?,
		},
		Command::Patterns { user_id, limit } => {
			let patterns = store
				.get_user_session_patterns(&user_id, limit)
				.await?
				.with_context(|| format!("no sessions found for user {user_id}"))?;
			print_json(&patterns)?;
		}
		Command::Delete { session_id } => {
			let deleted = store.delete_session(&session_id).await?;
			print_json(&json!({ "session_id": session_id, "deleted": deleted }))?;
		}
		Command::Purge { days_old } => {
			let days_old = days_old.unwrap_or(config.retention.days_old);
			let purged = store.purge_old_sessions(days_old).await?;
			print_json(&json!({ "days_old": days_old, "purged": purged }))?;
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;
	use relay_server_sessions::{create_pool, run_migrations, SqliteSessionStore};

	#[derive(Parser, Debug)]
	struct TestCli {
		#[command(subcommand)]
		command: Command,
	}

	fn parse(args: &[&str]) -> Command {
		let mut argv = vec!["relay-sessions"];
		argv.extend_from_slice(args);
		TestCli::try_parse_from(argv).unwrap().command
	}

	async fn store() -> SqliteSessionStore {
		let pool = create_pool("sqlite::memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();
		SqliteSessionStore::new(pool)
	}

	#[test]
	fn test_parse_append() {
		let command = parse(&[
			"append",
			"s1",
			"--type",
			"function_call",
			"--data",
			r#"{"name": "search"}"#,
		]);
		match command {
			Command::Append {
				session_id,
				event_type,
				data,
				metadata,
				..
			} => {
				assert_eq!(session_id.as_str(), "s1");
				assert_eq!(event_type, EventType::FunctionCall);
				assert_eq!(data, json!({"name": "search"}));
				assert!(metadata.is_none());
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn test_parse_rejects_bad_json_and_status() {
		let argv = ["relay-sessions", "append", "s1", "--type", "x", "--data", "{oops"];
		assert!(TestCli::try_parse_from(argv).is_err());

		let argv = ["relay-sessions", "update", "s1", "--status", "archived"];
		assert!(TestCli::try_parse_from(argv).is_err());
	}

	#[test]
	fn test_parse_purge_rejects_zero_days() {
		let argv = ["relay-sessions", "purge", "--days-old", "0"];
		assert!(TestCli::try_parse_from(argv).is_err());
		assert!(matches!(
			parse(&["purge"]),
			Command::Purge { days_old: None }
		));
	}

	#[tokio::test]
	async fn test_run_lifecycle() {
		let store = store().await;
		let config = ServerConfig::default();

		run(&store, &config, parse(&["create", "--user-id", "u1", "--session-id", "s1"]))
			.await
			.unwrap();
		run(
			&store,
			&config,
			parse(&["append", "s1", "--type", "user_message", "--data", r#"{"content":"hi"}"#]),
		)
		.await
		.unwrap();
		run(&store, &config, parse(&["close", "s1"])).await.unwrap();

		let session = store.get_session(&SessionId::new("s1").unwrap()).await.unwrap();
		assert_eq!(session.status, SessionStatus::Completed);

		let err = run(&store, &config, parse(&["update", "s1"])).await.unwrap_err();
		assert!(err.to_string().contains("nothing to update"));

		run(&store, &config, parse(&["purge"])).await.unwrap();
		store.get_session(&SessionId::new("s1").unwrap()).await.unwrap();
	}

	#[tokio::test]
	async fn test_run_patterns_for_unknown_user() {
		let store = store().await;
		let err = run(&store, &ServerConfig::default(), parse(&["patterns", "nobody"]))
			.await
			.unwrap_err();
		assert!(err.to_string().contains("no sessions found"));
	}
}
