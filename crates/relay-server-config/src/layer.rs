// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source, merged in precedence order.

use serde::Deserialize;

use crate::sections::{DatabaseConfigLayer, LoggingConfigLayer, RetentionConfigLayer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub retention: Option<RetentionConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.retention, other.retention, RetentionConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(current), Some(next)) => merge(current, next),
		(None, Some(next)) => *base = Some(next),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite:/a.db".to_string()),
				max_connections: Some(8),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite:/b.db".to_string()),
				max_connections: None,
			}),
			retention: Some(RetentionConfigLayer { days_old: Some(7) }),
			logging: None,
		});

		let database = base.database.unwrap();
		assert_eq!(database.url.as_deref(), Some("sqlite:/b.db"));
		assert_eq!(database.max_connections, Some(8));
		assert_eq!(base.retention.unwrap().days_old, Some(7));
		assert!(base.logging.is_none());
	}

	#[test]
	fn test_parse_toml_layer() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[database]
			url = "sqlite:/var/lib/relay/sessions.db"

			[retention]
			days_old = 14
			"#,
		)
		.unwrap();
		assert_eq!(
			layer.database.unwrap().url.as_deref(),
			Some("sqlite:/var/lib/relay/sessions.db")
		);
		assert_eq!(layer.retention.unwrap().days_old, Some(14));
	}

	#[test]
	fn test_unknown_section_rejected() {
		let result: Result<ServerConfigLayer, _> = toml::from_str("[weaver]\nenabled = true\n");
		assert!(result.is_err());
	}
}
