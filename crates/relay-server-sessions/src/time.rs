// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timestamp encoding for TEXT columns.
//!
//! Every timestamp is stored as UTC RFC 3339 with exactly six fractional
//! digits and a `Z` suffix, so that string comparison in SQL (`end_time < ?`,
//! `ORDER BY start_time`) matches chronological order. The schema defaults
//! produce the same shape. Only years 0001 through 9999 keep that shape, so
//! writes outside them are refused.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::error::{Result, SessionStoreError};

const STORABLE_YEARS: RangeInclusive<i32> = 1..=9999;

pub(crate) fn encode(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode(field: &str, raw: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| SessionStoreError::InvalidData(format!("invalid {field}: {e}")))
}

pub(crate) fn is_storable(ts: &DateTime<Utc>) -> bool {
	STORABLE_YEARS.contains(&ts.year())
}

/// Reject a caller-supplied timestamp whose encoding would not sort or parse.
pub(crate) fn check(field: &str, ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
	if is_storable(&ts) {
		Ok(ts)
	} else {
		Err(SessionStoreError::InvalidTimestamp(format!(
			"{field} {} is outside years 0001-9999",
			encode(&ts)
		)))
	}
}

pub(crate) fn decode_opt(field: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
	raw.map(|s| decode(field, &s)).transpose()
}

/// Truncate to the stored precision, so values handed back to callers equal
/// what a later read returns.
pub(crate) fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
	decode("timestamp", &encode(&ts)).unwrap_or(ts)
}

pub(crate) fn now() -> DateTime<Utc> {
	truncate(Utc::now())
}
