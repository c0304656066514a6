//! Lease TTL conversion between integer seconds and Vault duration strings.
//!
//! Outbound, TTLs are always rendered as `"<n>s"`. Inbound, Vault may report
//! a TTL either as a JSON integer (seconds) or as a duration string such as
//! `"768h"` or `"1h30m"`; both are normalized to whole seconds.

use serde::{Deserialize, Deserializer};

use crate::error::DurationError;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Render a number of seconds in the duration format Vault accepts.
#[must_use]
pub fn format_seconds(seconds: i64) -> String {
    format!("{seconds}s")
}

/// Parse a Vault duration string into whole seconds.
///
/// Accepts a bare integer (`"3600"`, interpreted as seconds) or a sequence
/// of decimal numbers with unit suffixes (`"1h30m"`, `"1.5h"`, `"90s"`).
/// Recognized units are `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`, and `d`.
/// Sub-second remainders are truncated.
///
/// # Errors
///
/// Returns [`DurationError`] if the input is empty, malformed, uses an
/// unknown unit, or does not fit into an `i64`.
pub fn parse_duration(input: &str) -> Result<i64, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if let Ok(seconds) = s.parse::<i64>() {
        return Ok(seconds);
    }

    let invalid = || DurationError::Invalid {
        input: input.to_owned(),
    };
    let overflow = || DurationError::Overflow {
        input: input.to_owned(),
    };

    let (negative, mut rest) = if let Some(r) = s.strip_prefix('-') {
        (true, r)
    } else if let Some(r) = s.strip_prefix('+') {
        (false, r)
    } else {
        (false, s)
    };
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale = unit_scale(unit, input)?;
        let nanos = scaled_nanos(number, scale).ok_or_else(invalid)?;
        total = total.checked_add(nanos).ok_or_else(overflow)?;
    }

    let seconds = total / NANOS_PER_SEC;
    let seconds = if negative { -seconds } else { seconds };
    i64::try_from(seconds).map_err(|_| overflow())
}

fn unit_scale(unit: &str, input: &str) -> Result<i128, DurationError> {
    Ok(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 86_400 * NANOS_PER_SEC,
        "" => {
            return Err(DurationError::Invalid {
                input: input.to_owned(),
            });
        }
        other => {
            return Err(DurationError::UnknownUnit {
                unit: other.to_owned(),
                input: input.to_owned(),
            });
        }
    })
}

/// `number` (digits with at most one `.`) times `scale` nanoseconds.
fn scaled_nanos(number: &str, scale: i128) -> Option<i128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    let mut numerator: i128 = 0;
    let mut denominator: i128 = 1;
    for digit in frac.bytes().take(18) {
        numerator = numerator * 10 + i128::from(digit - b'0');
        denominator *= 10;
    }
    nanos = nanos.checked_add(numerator.checked_mul(scale)? / denominator)?;
    Some(nanos)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTtl {
    Seconds(i64),
    Text(String),
}

/// Serde helper for TTL fields Vault reports as integers or duration strings.
///
/// # Errors
///
/// Fails when the value is neither an integer nor a parseable duration.
pub fn deserialize_ttl<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTtl::deserialize(deserializer)? {
        RawTtl::Seconds(seconds) => Ok(seconds),
        RawTtl::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn formats_seconds_with_suffix() {
        assert_eq!(format_seconds(3600), "3600s");
        assert_eq!(format_seconds(0), "0s");
    }

    #[test]
    fn parses_bare_integer_as_seconds() {
        assert_eq!(parse_duration("86400").unwrap(), 86_400);
        assert_eq!(parse_duration("0").unwrap(), 0);
    }

    #[test]
    fn parses_formatted_output_back() {
        assert_eq!(parse_duration(&format_seconds(43_200)).unwrap(), 43_200);
    }

    #[test]
    fn parses_compound_units() {
        assert_eq!(parse_duration("1h30m").unwrap(), 5_400);
        assert_eq!(parse_duration("768h").unwrap(), 2_764_800);
        assert_eq!(parse_duration("2d").unwrap(), 172_800);
        assert_eq!(parse_duration("1m30s").unwrap(), 90);
    }

    #[test]
    fn parses_fractions_and_truncates_subseconds() {
        assert_eq!(parse_duration("1.5h").unwrap(), 5_400);
        assert_eq!(parse_duration("1500ms").unwrap(), 1);
        assert_eq!(parse_duration("999ms").unwrap(), 0);
    }

    #[test]
    fn parses_signed_durations() {
        assert_eq!(parse_duration("-30s").unwrap(), -30);
        assert_eq!(parse_duration("+30s").unwrap(), 30);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_duration("  "), Err(DurationError::Empty));
        assert!(matches!(
            parse_duration("h"),
            Err(DurationError::Invalid { .. })
        ));
        assert!(matches!(
            parse_duration("10s5"),
            Err(DurationError::Invalid { .. })
        ));
        assert!(matches!(
            parse_duration("1.2.3s"),
            Err(DurationError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_unknown_units() {
        let err = parse_duration("3w").unwrap_err();
        assert_eq!(
            err,
            DurationError::UnknownUnit {
                unit: "w".to_owned(),
                input: "3w".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(DurationError::Invalid { .. } | DurationError::Overflow { .. })
        ));
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize_ttl")]
        ttl: i64,
    }

    #[test]
    fn deserializes_integer_and_string_ttls() {
        let from_int: Holder = serde_json::from_str(r#"{"ttl": 3600}"#).unwrap();
        assert_eq!(from_int.ttl, 3600);

        let from_str: Holder = serde_json::from_str(r#"{"ttl": "1h"}"#).unwrap();
        assert_eq!(from_str.ttl, 3600);

        assert!(serde_json::from_str::<Holder>(r#"{"ttl": "soon"}"#).is_err());
    }
}
