//! Domain helpers shared by the SDKs and the timeline pipeline

use chrono::{DateTime, Utc};
use serde::Serializer;
use std::fmt;

use crate::error::{Result, StoremanError};

/// Literal written to report files in place of a value that was never found.
pub const ABSENT: &str = "N/A";

/// Render an optional value using the absent sentinel.
pub fn or_absent(value: Option<&str>) -> &str {
    value.unwrap_or(ABSENT)
}

/// Read a report value back, treating the sentinel and empty strings as absent.
pub fn from_absent(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value == ABSENT {
        None
    } else {
        Some(value)
    }
}

/// Serde helper: `Some(v)` is written as the string form of `v`, `None` as
/// [`ABSENT`]. Every field keeps one JSON type across rows.
pub mod absent {
    use super::*;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        T: fmt::Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(ABSENT),
        }
    }
}

/// Time window of a log query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRange {
    /// Everything from `now - N seconds` up to now
    LastSeconds(u64),
    /// Explicit ISO-8601 bounds, both inclusive
    Between { from: String, to: String },
}

impl TimeRange {
    /// Build an explicit range, rejecting bounds that are not RFC 3339 timestamps.
    pub fn between(from: &str, to: &str) -> Result<Self> {
        let parsed_from = DateTime::parse_from_rfc3339(from)
            .map_err(|e| StoremanError::InvalidInput(format!("Invalid from time '{}': {}", from, e)))?;
        let parsed_to = DateTime::parse_from_rfc3339(to)
            .map_err(|e| StoremanError::InvalidInput(format!("Invalid to time '{}': {}", to, e)))?;
        if parsed_from > parsed_to {
            return Err(StoremanError::InvalidInput(format!(
                "Time range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(Self::Between {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// `(gte, lte)` bounds in the form the log backend understands.
    pub fn bounds(&self) -> (String, String) {
        match self {
            Self::LastSeconds(secs) => (format!("now-{}s", secs), "now".to_string()),
            Self::Between { from, to } => (from.clone(), to.clone()),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastSeconds(secs) => write!(f, "last {}s", secs),
            Self::Between { from, to } => write!(f, "{} .. {}", from, to),
        }
    }
}

/// Hour-resolution stamp used in result file names, e.g. `2026-01-06_12`.
pub fn file_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_round_trip() {
        assert_eq!(or_absent(None), "N/A");
        assert_eq!(or_absent(Some("0xabc")), "0xabc");
        assert_eq!(from_absent("N/A"), None);
        assert_eq!(from_absent("  "), None);
        assert_eq!(from_absent("12"), Some("12"));
    }

    #[test]
    fn test_time_range_bounds() {
        let range = TimeRange::LastSeconds(86400);
        assert_eq!(range.bounds(), ("now-86400s".to_string(), "now".to_string()));

        let range = TimeRange::between("2025-12-30T00:00:00Z", "2025-12-31T23:59:59Z").unwrap();
        assert_eq!(
            range.bounds(),
            ("2025-12-30T00:00:00Z".to_string(), "2025-12-31T23:59:59Z".to_string())
        );
    }

    #[test]
    fn test_time_range_rejects_bad_bounds() {
        assert!(TimeRange::between("yesterday", "2025-12-31T23:59:59Z").is_err());
        assert!(TimeRange::between("2026-01-02T00:00:00Z", "2026-01-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_file_stamp() {
        let now = Utc.with_ymd_and_hms(2026, 1, 6, 12, 30, 0).unwrap();
        assert_eq!(file_stamp(now), "2026-01-06_12");
    }
}
