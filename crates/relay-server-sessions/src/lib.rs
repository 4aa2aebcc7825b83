// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Relay sessions and their event logs.
//!
//! Uniqueness of `session_id`, referential integrity of events, cascade
//! deletion and `updated_at` bookkeeping are enforced by the schema in
//! [`schema`]. [`SqliteSessionStore`] maps engine constraint failures onto
//! [`SessionStoreError`] variants so callers can tell a duplicate session from
//! an event aimed at a session that does not exist.

pub mod error;
pub mod pool;
pub mod repository;
pub mod schema;
mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SessionStoreError};
pub use pool::{create_pool, create_pool_with_max_connections};
pub use repository::{SessionStore, SqliteSessionStore, RECENT_SESSIONS_LIMIT};
pub use schema::run_migrations;
