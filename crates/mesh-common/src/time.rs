//! CF-convention time decoding and provenance tag formatting.
//!
//! Time coordinates in model output are stored as offsets from a reference
//! epoch, described by a units string such as
//! `"seconds since 1970-01-01 00:00:00 +0000"`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used for the `system:time_start` and `analysis_time` raster tags.
pub const TAG_TIME_FORMAT: &str = "%Y%m%d %H%M%S";

/// Format used in output file names.
pub const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn microseconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1e6,
            TimeUnit::Minutes => 60e6,
            TimeUnit::Hours => 3600e6,
            TimeUnit::Days => 86400e6,
        }
    }
}

/// Parsed `"<unit> since <reference>"` units string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub reference: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF units string.
    ///
    /// Accepts a date, an optional time (`HH:MM[:SS[.fff]]`, or joined with
    /// `T`) and an optional UTC offset (`Z`, `UTC`, `+0000`, `-05:00`).
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit_str, reference_str) = units
            .trim()
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

        let unit = TimeUnit::parse(unit_str.trim())
            .ok_or_else(|| TimeParseError::UnsupportedUnit(unit_str.trim().to_string()))?;
        let reference = parse_reference(reference_str.trim())
            .ok_or_else(|| TimeParseError::InvalidReference(reference_str.trim().to_string()))?;

        Ok(Self { unit, reference })
    }

    /// Convert an offset in these units to an absolute UTC time.
    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>, TimeParseError> {
        if !value.is_finite() {
            return Err(TimeParseError::InvalidValue(value));
        }

        let micros = (value * self.unit.microseconds()).round();
        if micros.abs() > i64::MAX as f64 {
            return Err(TimeParseError::InvalidValue(value));
        }

        self.reference
            .checked_add_signed(Duration::microseconds(micros as i64))
            .ok_or(TimeParseError::InvalidValue(value))
    }

    /// Decode a whole coordinate array.
    pub fn decode_all(&self, values: &[f64]) -> Result<Vec<DateTime<Utc>>, TimeParseError> {
        values.iter().map(|&v| self.decode(v)).collect()
    }
}

impl fmt::Display for CfTimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        };
        write!(f, "{} since {}", unit, self.reference.format("%Y-%m-%d %H:%M:%S"))
    }
}

fn parse_reference(s: &str) -> Option<DateTime<Utc>> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    // "2019-05-01T06:00:00Z" carries date and time in one token
    let first = tokens.remove(0);
    let (date_str, joined_time) = match first.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (first, None),
    };
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;

    let mut time = NaiveTime::MIN;
    let mut offset = FixedOffset::east_opt(0)?;

    for token in joined_time.into_iter().chain(tokens) {
        if let Some(t) = parse_time_of_day(token) {
            time = t;
        } else if let Some(o) = parse_offset(token) {
            offset = o;
        } else {
            return None;
        }
    }

    let local = NaiveDateTime::new(date, time);
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_time_of_day(token: &str) -> Option<NaiveTime> {
    let token = token.trim_end_matches('Z');
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(token, fmt).ok())
}

fn parse_offset(token: &str) -> Option<FixedOffset> {
    let upper = token.to_uppercase();
    if matches!(upper.as_str(), "Z" | "UTC" | "GMT") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (digits[..split].parse::<i32>().ok()?, digits[split..].parse::<i32>().ok()?)
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Format a timestamp for raster provenance tags (`YYYYMMDD HHMMSS`).
pub fn format_tag_time(dt: &DateTime<Utc>) -> String {
    dt.format(TAG_TIME_FORMAT).to_string()
}

/// Format a timestamp for output file names (`YYYYMMDD_HHMMSS`).
pub fn format_file_time(dt: &DateTime<Utc>) -> String {
    dt.format(FILE_TIME_FORMAT).to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),

    #[error("Unsupported time unit: {0}")]
    UnsupportedUnit(String),

    #[error("Invalid reference time: {0}")]
    InvalidReference(String),

    #[error("Time value cannot be represented: {0}")]
    InvalidValue(f64),
}
