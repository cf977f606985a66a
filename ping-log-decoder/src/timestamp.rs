//! Absolute timestamp reconstruction
//!
//! Ping Viewer names each recording after the moment it started
//! (`YYYYMMDD-HHMMSSfff.bin`) and stamps every record with the time elapsed
//! since then (`hh:mm:ss.ffffff`, UTF-16 padded). Adding the two gives the
//! absolute time of each message.

use crate::types::{DecoderError, Result, Timestamp};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::path::Path;

/// Format used for the `real_time` column
pub const REAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Accepted file stem layouts, by sub-second digit count
const ORIGIN_FORMATS: [(usize, &str); 3] = [
    (3, "%Y%m%d-%H%M%S%3f"),
    (6, "%Y%m%d-%H%M%S%6f"),
    (9, "%Y%m%d-%H%M%S%9f"),
];

/// Length of the `YYYYMMDD-HHMMSS` prefix
const ORIGIN_PREFIX_LEN: usize = 15;

/// Recording start time encoded in a log file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OriginTime(Timestamp);

impl OriginTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    /// Parse a file stem such as `20250306-115328280`
    pub fn parse(stem: &str) -> Result<Self> {
        let digits = stem.len().saturating_sub(ORIGIN_PREFIX_LEN);
        ORIGIN_FORMATS
            .iter()
            .find(|(len, _)| *len == digits)
            .and_then(|(_, fmt)| NaiveDateTime::parse_from_str(stem, fmt).ok())
            .map(OriginTime)
            .ok_or_else(|| DecoderError::InvalidFileName(stem.to_string()))
    }

    /// Parse the origin time from a log file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DecoderError::InvalidFileName(path.display().to_string()))?;
        Self::parse(stem)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.0
    }
}

/// Remove the null padding left by UTF-16 storage
pub fn clean_offset(raw: &str) -> String {
    raw.replace('\0', "")
}

/// Two-digit `hh:mm:ss`, optionally followed by `.` and at least one digit
fn has_offset_shape(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 8 || b[2] != b':' || b[5] != b':' {
        return false;
    }
    let fields_are_digits = [0, 1, 3, 4, 6, 7].iter().all(|&i| b[i].is_ascii_digit());
    let fraction_ok = match b.len() {
        8 => true,
        _ => b[8] == b'.' && b.len() > 9 && b[9..].iter().all(u8::is_ascii_digit),
    };
    fields_are_digits && fraction_ok
}

/// Parse a relative offset (`hh:mm:ss[.ffffff]`) into a duration
///
/// Precision is truncated to microseconds.
pub fn parse_offset(raw: &str) -> Result<Duration> {
    let clean = clean_offset(raw);
    let invalid = |reason: String| DecoderError::TimestampParse {
        raw: clean.clone(),
        reason,
    };
    if !has_offset_shape(&clean) {
        return Err(invalid("expected hh:mm:ss[.ffffff]".to_string()));
    }
    let time = NaiveTime::parse_from_str(&clean, "%H:%M:%S%.f").map_err(|e| invalid(e.to_string()))?;
    // chrono folds a leap second into the nanoseconds
    if time.nanosecond() >= 1_000_000_000 {
        return Err(invalid("seconds out of range".to_string()));
    }
    let micros = time.num_seconds_from_midnight() as i64 * 1_000_000
        + (time.nanosecond() / 1_000) as i64;
    Ok(Duration::microseconds(micros))
}

/// Absolute time of a record: origin plus the parsed relative offset
///
/// No day rollover is applied; the offset is elapsed time, not a time of day.
pub fn reconstruct(origin: OriginTime, raw_offset: &str) -> Result<Timestamp> {
    Ok(origin.0 + parse_offset(raw_offset)?)
}

/// Render a timestamp for the `real_time` column
pub fn format_real_time(ts: &Timestamp) -> String {
    ts.format(REAL_TIME_FORMAT).to_string()
}
