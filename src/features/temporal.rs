use std::f64::consts::PI;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;
/// Mean Gregorian year of 365.2425 days.
pub const SECONDS_PER_YEAR: f64 = 365.2425 * SECONDS_PER_DAY;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Parses a timestamp as UTC. Offsets are honoured; naive values are taken
/// to be UTC already; bare dates map to midnight.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// sin(2π·t/period) for Unix seconds `t`.
pub fn phase_sin(unix_seconds: i64, period_seconds: f64) -> f64 {
    (unix_seconds as f64 * (2.0 * PI / period_seconds)).sin()
}

pub fn daily_sin(unix_seconds: i64) -> f64 {
    phase_sin(unix_seconds, SECONDS_PER_DAY)
}

pub fn yearly_sin(unix_seconds: i64) -> f64 {
    phase_sin(unix_seconds, SECONDS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parses_supported_forms() {
        let expected = Utc.with_ymd_and_hms(2022, 1, 2, 9, 51, 0).unwrap();
        for s in [
            "2022-01-02T09:51:00Z",
            "2022-01-02T09:51:00+00:00",
            "2022-01-02 09:51:00",
            "2022-01-02T09:51:00",
            "2022-01-02 09:51:00+00:00",
            "2022-01-02 10:51:00+01:00",
            " 2022-01-02 09:51:00.000 ",
        ] {
            assert_eq!(parse_timestamp(s), Some(expected), "{s}");
        }

        let date = parse_timestamp("2022-01-02").unwrap();
        assert_eq!(date.hour(), 0);
        assert_eq!(date.day(), 2);
        assert!(parse_timestamp("02/01/2022").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_phase_values() {
        assert_abs_diff_eq!(daily_sin(0), 0.0);
        assert_abs_diff_eq!(daily_sin(6 * 3600), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(daily_sin(18 * 3600), -1.0, epsilon = 1e-12);

        let quarter_year = (SECONDS_PER_YEAR / 4.0) as i64;
        assert_abs_diff_eq!(yearly_sin(quarter_year), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_phase_is_deterministic() {
        let t = 1_656_672_660;
        assert_eq!(daily_sin(t).to_bits(), daily_sin(t).to_bits());
        assert_eq!(yearly_sin(t).to_bits(), yearly_sin(t).to_bits());
        // a whole number of days apart gives the same daily phase
        assert_abs_diff_eq!(daily_sin(t), daily_sin(t + 86_400 * 3), epsilon = 1e-9);
    }
}
