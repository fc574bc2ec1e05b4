//! Parsing of the reference instant given on the command line.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("empty reference time")]
    Empty,
    #[error("unrecognized reference time '{0}'")]
    Invalid(String),
    #[error("bad offset in reference time '{spec}': {message}")]
    Offset { spec: String, message: String },
}

/// Resolve `now`, `today`, an RFC 3339 timestamp, `YYYY-MM-DD[ HH:MM:SS]` (UTC) or any of
/// these followed by a signed humantime offset, e.g. `now - 2d` or `2025-01-01 + 6h`.
pub fn parse_reference(spec: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ReferenceError> {
    let s = spec.trim();
    if s.is_empty() {
        return Err(ReferenceError::Empty);
    }

    let lower = s.to_ascii_lowercase();
    for (keyword, base) in [("now", now), ("today", start_of_day(now))] {
        if lower.starts_with(keyword) {
            return apply_offset(base, &s[keyword.len()..], spec);
        }
    }

    if let Some(t) = parse_absolute(s) {
        return Ok(t);
    }

    // Absolute with offset: 2025-01-01T00:00:00Z - 2d
    if let Some(idx) = s.rfind(['+', '-']) {
        if idx >= 10 {
            if let Some(base) = parse_absolute(s[..idx].trim()) {
                return apply_offset(base, &s[idx..], spec);
            }
        }
    }

    Err(ReferenceError::Invalid(spec.to_string()))
}

fn apply_offset(
    base: DateTime<Utc>,
    offset: &str,
    spec: &str,
) -> Result<DateTime<Utc>, ReferenceError> {
    let offset = offset.trim();
    if offset.is_empty() {
        return Ok(base);
    }
    let (negative, rest) = match (offset.strip_prefix('-'), offset.strip_prefix('+')) {
        (Some(rest), _) => (true, rest),
        (None, Some(rest)) => (false, rest),
        (None, None) => return Err(ReferenceError::Invalid(spec.to_string())),
    };
    let duration = parse_duration(rest).map_err(|message| ReferenceError::Offset {
        spec: spec.to_string(),
        message,
    })?;
    let shifted = if negative {
        base.checked_sub_signed(duration)
    } else {
        base.checked_add_signed(duration)
    };
    shifted.ok_or_else(|| ReferenceError::Offset {
        spec: spec.to_string(),
        message: "result is out of range".into(),
    })
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn keywords_and_offsets() {
        assert_eq!(parse_reference("now", now()), Ok(now()));
        assert_eq!(parse_reference(" NOW ", now()), Ok(now()));
        assert_eq!(
            parse_reference("now - 2d", now()),
            Ok(Utc.with_ymd_and_hms(2025, 3, 12, 15, 9, 26).unwrap())
        );
        assert_eq!(
            parse_reference("today+1h", now()),
            Ok(Utc.with_ymd_and_hms(2025, 3, 14, 1, 0, 0).unwrap())
        );
    }

    #[test]
    fn absolute_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_reference("2025-01-01T00:00:00Z", now()), Ok(expected));
        assert_eq!(parse_reference("2025-01-01T01:00:00+01:00", now()), Ok(expected));
        assert_eq!(parse_reference("2025-01-01", now()), Ok(expected));
        assert_eq!(parse_reference("2025-01-01 00:00:00", now()), Ok(expected));
        assert_eq!(
            parse_reference("2025-01-01T00:00:00Z + 6h", now()),
            Ok(Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap())
        );
        assert_eq!(
            parse_reference("2025-01-11 - 1day", now()),
            Ok(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn offsets_past_the_calendar_are_errors() {
        assert!(matches!(
            parse_reference("now + 270000years", now()),
            Err(ReferenceError::Offset { .. })
        ));
        assert!(matches!(
            parse_reference("now - 270000years", now()),
            Err(ReferenceError::Offset { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_reference("", now()), Err(ReferenceError::Empty));
        assert!(matches!(
            parse_reference("tomorrow", now()),
            Err(ReferenceError::Invalid(_))
        ));
        assert!(matches!(
            parse_reference("now - soon", now()),
            Err(ReferenceError::Offset { .. })
        ));
        assert!(matches!(
            parse_reference("now 2d", now()),
            Err(ReferenceError::Invalid(_))
        ));
    }
}
