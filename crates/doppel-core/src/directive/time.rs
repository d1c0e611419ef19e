//! Time-string grammar for timed memories.
//!
//! `<digits><unit>` where unit is `s`, `m`, `h` or `d` (case-insensitive),
//! with nothing before or after apart from surrounding whitespace.

use chrono::TimeDelta;

use doppel_types::error::InvalidTimeFormat;

/// Parse a time string such as `30m` or `2d` into a span.
pub fn parse_time_string(raw: &str) -> Result<TimeDelta, InvalidTimeFormat> {
    let invalid = || InvalidTimeFormat(raw.trim().to_string());

    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, unit) = trimmed.split_at(digits_end);
    if digits.is_empty() {
        return Err(invalid());
    }

    let seconds_per_unit: i64 = match unit.to_ascii_lowercase().as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    let value: i64 = digits.parse().map_err(|_| invalid())?;
    value
        .checked_mul(seconds_per_unit)
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_time_string("45s").unwrap(), TimeDelta::seconds(45));
        assert_eq!(parse_time_string("10m").unwrap(), TimeDelta::minutes(10));
        assert_eq!(parse_time_string("1h").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_time_string("2d").unwrap(), TimeDelta::days(2));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(parse_time_string(" 3H ").unwrap(), TimeDelta::hours(3));
        assert_eq!(parse_time_string("0s").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_rejects_other_forms() {
        for raw in ["", "h", "1", "1w", "1 h", "1hr", "-1h", "1.5h", "in 1h", "1h!", "١h"] {
            assert_eq!(
                parse_time_string(raw),
                Err(InvalidTimeFormat(raw.trim().to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(parse_time_string("99999999999999999999d").is_err());
        assert!(parse_time_string("9223372036854775807d").is_err());
    }
}
