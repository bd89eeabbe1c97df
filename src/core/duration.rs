//! Packed time-span strings such as `8y3d4h15m3s`.
//!
//! Units: `y` (365 days), `d`, `h`, `m`, `s`. Tokens may appear in any order,
//! each is optional, and whitespace is ignored, so `30s`, `5m` and `1d 12h`
//! are all valid.

use chrono::{DateTime, Duration, Utc};

use crate::error::{ModError, Result};

/// Parses a packed time span.
///
/// # Examples
///
/// ```
/// use chatmod::core::parse_timedelta;
/// use chrono::{DateTime, Duration, Utc};
///
/// # fn main() -> chatmod::Result<()> {
/// assert_eq!(parse_timedelta("1h30m")?, Duration::minutes(90));
/// assert_eq!(parse_timedelta("2d")?, Duration::days(2));
/// assert!(parse_timedelta("soon").is_err());
/// # Ok(())
/// # }
/// ```
pub fn parse_timedelta(input: &str) -> Result<Duration> {
    let mut total = Duration::zero();
    let mut digits = String::new();
    let mut seen_token = false;

    for c in input.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(ModError::invalid_duration(input));
        }
        let amount: i64 = digits
            .parse()
            .map_err(|_| ModError::invalid_duration(input))?;
        let unit = match c.to_ascii_lowercase() {
            'y' => Duration::try_days(amount.saturating_mul(365)),
            'd' => Duration::try_days(amount),
            'h' => Duration::try_hours(amount),
            'm' => Duration::try_minutes(amount),
            's' => Duration::try_seconds(amount),
            _ => None,
        }
        .ok_or_else(|| ModError::invalid_duration(input))?;

        total = total
            .checked_add(&unit)
            .ok_or_else(|| ModError::invalid_duration(input))?;
        digits.clear();
        seen_token = true;
    }

    // trailing number without a unit
    if !digits.is_empty() || !seen_token {
        return Err(ModError::invalid_duration(input));
    }
    Ok(total)
}

/// The instant `span` before `now`.
///
/// Spans reaching past the representable date range are rejected like any
/// other malformed span.
///
/// ```
/// use chatmod::core::duration::span_before;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
/// let day_before = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(span_before(now, "1d").unwrap(), day_before);
/// assert!(span_before(now, "1000000y").is_err());
/// ```
pub fn span_before(now: DateTime<Utc>, span: &str) -> Result<DateTime<Utc>> {
    let delta = parse_timedelta(span)?;
    now.checked_sub_signed(delta)
        .ok_or_else(|| ModError::invalid_duration(span))
}
