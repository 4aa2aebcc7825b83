// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relay session store command-line tool.

use std::path::PathBuf;

use clap::Parser;
use relay_server_sessions::{create_pool_with_max_connections, run_migrations, SqliteSessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Command;

/// Inspect and maintain Relay conversation sessions.
#[derive(Parser, Debug)]
#[command(name = "relay-sessions", about = "Relay session store", version)]
struct Args {
	/// Config file (defaults to /etc/relay/sessions.toml)
	#[arg(long, global = true, env = "RELAY_CONFIG")]
	config: Option<PathBuf>,

	/// Override the configured database URL
	#[arg(long, global = true)]
	database_url: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// Load .env file if present
	dotenvy::dotenv().ok();

	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => relay_server_config::load_config_with_file(path)?,
		None => relay_server_config::load_config()?,
	};
	if let Some(url) = args.database_url.clone() {
		config.database.url = url;
	}

	// Logs go to stderr; stdout carries command output.
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	tracing::debug!(database = %config.database.url, "opening session store");

	let pool =
		create_pool_with_max_connections(&config.database.url, config.database.max_connections)
			.await?;
	run_migrations(&pool).await?;
	let store = SqliteSessionStore::new(pool.clone());

	let result = commands::run(&store, &config, args.command).await;
	pool.close().await;
	result
}
