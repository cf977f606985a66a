//! Output row construction
//!
//! Turns decoded messages into table rows with engineering units:
//! - Ping1D messages become one [`PointRow`] each
//! - Ping360 scan steps become one [`ProfileRow`] per intensity sample

use crate::config::SonarConstants;
use crate::timestamp::{self, OriginTime};
use crate::types::{DecodedMessage, DistanceReading, Payload, Result, SweepStep, Timestamp};
use serde::{Serialize, Serializer};

/// Point table columns, in order
pub const POINT_COLUMNS: [&str; 11] = [
    "real_time",
    "timestamp_offset",
    "message_id",
    "distance",
    "confidence",
    "transmit_duration",
    "ping_number",
    "scan_start",
    "scan_length",
    "gain_setting",
    "profile_data_length",
];

/// Profile table columns, in order
pub const PROFILE_COLUMNS: [&str; 6] = [
    "real_time",
    "timestamp_offset",
    "angle_deg",
    "sample_index",
    "distance_m",
    "intensity",
];

fn serialize_real_time<S: Serializer>(ts: &Timestamp, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp::format_real_time(ts))
}

/// Time columns shared by every row built from one record
#[derive(Debug, Clone, PartialEq)]
pub struct RowStamp {
    pub real_time: Timestamp,
    /// Relative offset with padding removed
    pub timestamp_offset: String,
}

impl RowStamp {
    /// Reconstruct the absolute time of a record
    pub fn new(origin: OriginTime, raw_offset: &str) -> Result<Self> {
        Ok(Self {
            real_time: timestamp::reconstruct(origin, raw_offset)?,
            timestamp_offset: timestamp::clean_offset(raw_offset),
        })
    }
}

/// One row of the Ping1D table
///
/// Field order is the column order; `None` renders as an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointRow {
    #[serde(serialize_with = "serialize_real_time")]
    pub real_time: Timestamp,
    pub timestamp_offset: String,
    pub message_id: u16,
    pub distance: Option<u32>,
    pub confidence: Option<u16>,
    pub transmit_duration: Option<u16>,
    pub ping_number: Option<u32>,
    pub scan_start: Option<u32>,
    pub scan_length: Option<u32>,
    pub gain_setting: Option<u32>,
    pub profile_data_length: Option<u16>,
}

/// One row of the Ping360 table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRow {
    #[serde(serialize_with = "serialize_real_time")]
    pub real_time: Timestamp,
    pub timestamp_offset: String,
    pub angle_deg: f64,
    pub sample_index: usize,
    pub distance_m: f64,
    pub intensity: u8,
}

/// Build the single point row for a Ping1D message
///
/// Messages without distance fields still produce a row, with those cells
/// left empty.
pub fn build_point(stamp: &RowStamp, message: &DecodedMessage) -> PointRow {
    let empty = DistanceReading::default();
    let reading = match &message.payload {
        Payload::Distance(reading) => reading,
        _ => &empty,
    };

    PointRow {
        real_time: stamp.real_time,
        timestamp_offset: stamp.timestamp_offset.clone(),
        message_id: message.message_id,
        distance: reading.distance,
        confidence: reading.confidence,
        transmit_duration: reading.transmit_duration,
        ping_number: reading.ping_number,
        scan_start: reading.scan_start,
        scan_length: reading.scan_length,
        gain_setting: reading.gain_setting,
        profile_data_length: reading.profile_data_length,
    }
}

/// Expand a Ping360 scan step into one row per intensity sample
///
/// The range conversion is derived from this step's own sample period.
pub fn build_profile(stamp: &RowStamp, sweep: &SweepStep, constants: &SonarConstants) -> Vec<ProfileRow> {
    let angle_deg = constants.angle_degrees(sweep.angle);
    let distance_per_sample = constants.distance_per_sample(sweep.sample_period);

    sweep
        .data
        .iter()
        .enumerate()
        .map(|(i, &intensity)| ProfileRow {
            real_time: stamp.real_time,
            timestamp_offset: stamp.timestamp_offset.clone(),
            angle_deg,
            sample_index: i,
            distance_m: i as f64 * distance_per_sample,
            intensity,
        })
        .collect()
}
