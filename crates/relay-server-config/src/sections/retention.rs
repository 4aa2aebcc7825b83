// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retention policy for ended sessions.

use serde::Deserialize;

const DEFAULT_DAYS_OLD: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
	/// Ended sessions older than this many days are purged.
	pub days_old: u32,
}

impl Default for RetentionConfig {
	fn default() -> Self {
		Self {
			days_old: DEFAULT_DAYS_OLD,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfigLayer {
	#[serde(default)]
	pub days_old: Option<u32>,
}

impl RetentionConfigLayer {
	pub fn merge(&mut self, other: RetentionConfigLayer) {
		if other.days_old.is_some() {
			self.days_old = other.days_old;
		}
	}

	pub fn finalize(self) -> RetentionConfig {
		RetentionConfig {
			days_old: self.days_old.unwrap_or(DEFAULT_DAYS_OLD),
		}
	}
}
