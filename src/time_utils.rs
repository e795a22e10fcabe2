// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a client-supplied date: full RFC3339, or `YYYY-MM-DD` taken as
/// midnight UTC.
pub fn parse_client_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_client_date() {
        assert_eq!(
            parse_client_date("2025-04-01T10:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(
            parse_client_date(" 2025-04-01 "),
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_client_date("yesterday"), None);
        assert_eq!(parse_client_date("2025-02-30"), None);
    }

    #[test]
    fn test_format_uses_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2025-04-01T08:00:00Z");
    }
}
