//! Wire timestamp parsing and formatting.
//!
//! All timestamps on the wire are ISO-8601 UTC with millisecond precision
//! and a literal `Z` suffix. Display conversion to a local timezone is a
//! pure formatting concern kept out of the engine.

use chrono::{DateTime, FixedOffset, Utc};

/// Wire format for event timestamps: millisecond precision, literal `Z`.
pub const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Formats a timestamp for the wire (e.g. `2024-05-01T12:00:00.000Z`).
pub fn format_event_timestamp(ts: &DateTime<Utc>) -> String {
	ts.format(EVENT_TIMESTAMP_FORMAT).to_string()
}

/// Parses a wire timestamp.
///
/// Accepts any RFC-3339 precision on input; the backend emits milliseconds
/// but is not required to.
pub fn parse_event_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
	DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

/// Formats a timestamp for display in a fixed-offset local timezone.
///
/// Falls back to UTC when the offset is out of range; configuration
/// validation bounds the offset before it reaches here.
pub fn format_local(ts: &DateTime<Utc>, utc_offset_hours: i8) -> String {
	const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

	match FixedOffset::east_opt(i32::from(utc_offset_hours) * 3600) {
		Some(offset) => ts.with_timezone(&offset).format(DISPLAY_FORMAT).to_string(),
		None => ts.format(DISPLAY_FORMAT).to_string(),
	}
}

/// Serde adapter enforcing the wire timestamp format.
pub mod iso_millis {
	use chrono::{DateTime, Utc};
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&super::format_event_timestamp(ts))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		super::parse_event_timestamp(&raw).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_format_carries_millisecond_precision() {
		let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
		assert_eq!(format_event_timestamp(&ts), "2024-05-01T12:00:00.000Z");
	}

	#[test]
	fn test_parse_round_trip() {
		let raw = "2024-05-01T12:00:00.000Z";
		let ts = parse_event_timestamp(raw).unwrap();
		assert_eq!(format_event_timestamp(&ts), raw);
	}

	#[test]
	fn test_parse_accepts_other_precisions() {
		let ts = parse_event_timestamp("2024-05-01T12:00:00Z").unwrap();
		assert_eq!(format_event_timestamp(&ts), "2024-05-01T12:00:00.000Z");

		let ts = parse_event_timestamp("2024-05-01T12:00:00.123456Z").unwrap();
		assert_eq!(format_event_timestamp(&ts), "2024-05-01T12:00:00.123Z");
	}

	#[test]
	fn test_parse_rejects_garbage() {
		assert!(parse_event_timestamp("yesterday").is_err());
	}

	#[test]
	fn test_format_local_applies_offset() {
		let ts = parse_event_timestamp("2024-05-01T22:30:00.000Z").unwrap();
		// UTC+7 rolls over to the next day.
		assert_eq!(format_local(&ts, 7), "2024-05-02 05:30:00");
		assert_eq!(format_local(&ts, 0), "2024-05-01 22:30:00");
	}
}
