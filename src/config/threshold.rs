//! Staleness threshold parsing and formatting.
//!
//! Thresholds are written as a sequence of `<number><unit>` terms, for
//! example `48h`, `5m`, `2d 12h` or `1w`. Units: `s`, `m`, `h`, `d`, `w`
//! and their long forms (`minutes`, `days`, ...).

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

fn term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*([a-z]+)").expect("valid duration regex"))
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR),
        "d" | "day" | "days" => Some(DAY),
        "w" | "week" | "weeks" => Some(WEEK),
        _ => None,
    }
}

/// Parse a human-written duration such as `"2d 12h"`.
///
/// # Errors
///
/// Returns a description of the problem when the input is empty, contains
/// text that is not a `<number><unit>` term, uses an unknown unit, or
/// overflows.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("duration is empty".to_string());
    }

    let mut total: u64 = 0;
    let mut consumed = 0;
    for caps in term_regex().captures_iter(trimmed) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let start = caps.get(0).map_or(0, |m| m.start());
        if !trimmed[consumed..start].trim().is_empty() {
            return Err(format!("unexpected text in duration '{input}'"));
        }
        consumed = start + whole.len();

        let amount: u64 = caps[1]
            .parse()
            .map_err(|_| format!("number too large in duration '{input}'"))?;
        let unit = &caps[2];
        let scale = unit_seconds(unit)
            .ok_or_else(|| format!("unknown unit '{unit}' in duration '{input}'"))?;
        total = amount
            .checked_mul(scale)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("duration '{input}' is too large"))?;
    }

    if consumed == 0 || !trimmed[consumed..].trim().is_empty() {
        return Err(format!(
            "invalid duration '{input}' (expected terms like 48h, 5m or 2d 12h)"
        ));
    }

    Ok(Duration::from_secs(total))
}

/// Format a duration for people, e.g. `2 days` or `1 hour 30 minutes`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0 seconds".to_string();
    }

    let mut parts = Vec::new();
    for (size, name) in [(DAY, "day"), (HOUR, "hour"), (MINUTE, "minute"), (1, "second")] {
        let count = secs / size;
        secs %= size;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {name}{plural}"));
        }
    }
    parts.join(" ")
}

/// Format a duration in the compact form accepted by [`parse_duration`].
#[must_use]
pub fn format_compact(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (size, unit) in [(DAY, 'd'), (HOUR, 'h'), (MINUTE, 'm'), (1, 's')] {
        let count = secs / size;
        secs %= size;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push(unit);
        }
    }
    out
}

/// Serde adapter storing durations as compact strings.
///
/// Deserialization also accepts a bare integer, read as seconds.
pub mod serde_duration {
    use super::{format_compact, parse_duration};
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_compact(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration such as \"48h\" or a number of seconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
                parse_duration(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
                Ok(Duration::from_secs(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
                u64::try_from(v)
                    .map(Duration::from_secs)
                    .map_err(|_| E::custom("duration must not be negative"))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}
