//! Core types for the Ping log decoder library
//!
//! This module defines the values the decoder emits when reading a Ping Viewer
//! recording: decoded Ping protocol messages paired with their raw relative
//! timestamps, plus the error type shared by the whole crate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Absolute timestamp type used throughout the decoder
///
/// Recordings carry no time zone, so times are kept as naive wall-clock values
/// in whatever zone the recording machine used.
pub type Timestamp = NaiveDateTime;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Cannot access {path:?}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse log file: {0}")]
    LogParse(String),

    #[error("Invalid relative timestamp {raw:?}: {reason}")]
    TimestampParse { raw: String, reason: String },

    #[error("File name does not encode an origin time: {0}")]
    InvalidFileName(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    /// Wrap an IO error with the path it happened on
    pub fn path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DecoderError::Path {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by unreadable content rather than by the filesystem
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            DecoderError::LogParse(_)
                | DecoderError::TimestampParse { .. }
                | DecoderError::InvalidFileName(_)
                | DecoderError::InvalidData(_)
        )
    }
}

/// Sonar device families recorded by Ping Viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Single-beam echosounder: one distance/confidence reading per ping
    Ping1D,
    /// Scanning sonar: one intensity profile per angular step
    Ping360,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Ping1D => write!(f, "ping1d"),
            DeviceType::Ping360 => write!(f, "ping360"),
        }
    }
}

/// One decoded Ping protocol message
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Ping protocol message id
    pub message_id: u16,
    /// Sending device id
    pub src_device_id: u8,
    /// Receiving device id
    pub dst_device_id: u8,
    /// Message fields, tagged by layout
    pub payload: Payload,
}

/// Decoded message payload
///
/// Each recognized layout exposes its fields explicitly; a field the message
/// layout does not carry is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Ping1D `distance_simple` (1212), `distance` (1211) or `profile` (1300)
    Distance(DistanceReading),
    /// Ping360 `device_data` (2300) or `auto_device_data` (2301)
    Sweep(SweepStep),
    /// Any other message, payload kept raw
    Other(Vec<u8>),
}

/// Fields of a Ping1D distance-family message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceReading {
    /// Distance to target in mm
    pub distance: Option<u32>,
    /// Confidence in percent
    pub confidence: Option<u16>,
    /// Acoustic pulse duration in us
    pub transmit_duration: Option<u16>,
    pub ping_number: Option<u32>,
    /// Start of the scan region in mm
    pub scan_start: Option<u32>,
    /// Length of the scan region in mm
    pub scan_length: Option<u32>,
    pub gain_setting: Option<u32>,
    pub profile_data_length: Option<u16>,
    /// Echo strength profile (1300 only)
    pub profile_data: Vec<u8>,
}

/// Fields of a Ping360 scan step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepStep {
    pub mode: u8,
    pub gain_setting: u8,
    /// Head angle in gradians (0-399)
    pub angle: u16,
    /// Acoustic pulse duration in us
    pub transmit_duration: u16,
    /// Time between samples in 25 ns ticks
    pub sample_period: u16,
    /// Transmit frequency in kHz
    pub transmit_frequency: u16,
    pub number_of_samples: u16,
    /// Intensity samples, nearest first
    pub data: Vec<u8>,
}

/// A single entry from a log: the raw relative timestamp and its message
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Elapsed time since recording start, exactly as stored (may contain
    /// null padding)
    pub timestamp_offset: String,
    pub message: DecodedMessage,
}

impl LogRecord {
    /// Convenience accessor for the message id
    pub fn message_id(&self) -> u16 {
        self.message.message_id
    }
}
