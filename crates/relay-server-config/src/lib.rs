// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Relay session store.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`RELAY_*`)
//!
//! # Usage
//!
//! ```ignore
//! use relay_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Sessions stored at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub retention: RetentionConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`RELAY_*`)
/// 2. Config file (`/etc/relay/sessions.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		retention: layer.retention.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		database = %config.database.url,
		max_connections = config.database.max_connections,
		retention_days = config.retention.days_old,
		"Session store configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.retention.days_old == 0 {
		return Err(ConfigError::Validation(
			"retention.days_old must be greater than zero".to_string(),
		));
	}
	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be greater than zero".to_string(),
		));
	}
	if config.database.url.trim().is_empty() {
		return Err(ConfigError::Validation(
			"database.url must not be empty".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config, ServerConfig::default());
		assert_eq!(config.database.url, "sqlite:./relay.db");
		assert_eq!(config.retention.days_old, 30);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_zero_retention_rejected() {
		let layer = ServerConfigLayer {
			retention: Some(RetentionConfigLayer { days_old: Some(0) }),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("days_old"));
	}

	#[test]
	fn test_zero_connections_rejected() {
		let layer = ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: None,
				max_connections: Some(0),
			}),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_file_source_over_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sessions.toml");
		std::fs::write(
			&path,
			"[database]\nurl = \"sqlite:/srv/relay.db\"\n\n[logging]\nlevel = \"debug\"\n",
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(TomlSource::new(&path)),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.database.url, "sqlite:/srv/relay.db");
		assert_eq!(config.logging.level, "debug");
		assert_eq!(config.retention.days_old, 30);
	}
}
