//! Device type classification
//!
//! Recordings are assumed to hold traffic from a single device, so the first
//! recognized message id settles the type and the rest of the file is never
//! read.

use crate::formats::ping_protocol::{
    AUTO_DEVICE_DATA_ID, DEVICE_DATA_ID, DISTANCE_ID, DISTANCE_SIMPLE_ID, PROFILE_ID,
};
use crate::types::{DeviceType, LogRecord, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message ids that only a Ping1D emits
pub const PING1D_IDS: [u16; 3] = [DISTANCE_ID, DISTANCE_SIMPLE_ID, PROFILE_ID];

/// Message ids that only a Ping360 emits
pub const PING360_IDS: [u16; 2] = [DEVICE_DATA_ID, AUTO_DEVICE_DATA_ID];

/// Outcome of scanning a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Ping1D,
    Ping360,
    /// No recognized id before the stream ended (or the stream failed)
    Unknown,
}

impl Classification {
    /// Classification implied by a single message id
    pub fn from_message_id(id: u16) -> Self {
        if PING1D_IDS.contains(&id) {
            Classification::Ping1D
        } else if PING360_IDS.contains(&id) {
            Classification::Ping360
        } else {
            Classification::Unknown
        }
    }

    /// The recognized device type, if any
    pub fn device_type(self) -> Option<DeviceType> {
        match self {
            Classification::Ping1D => Some(DeviceType::Ping1D),
            Classification::Ping360 => Some(DeviceType::Ping360),
            Classification::Unknown => None,
        }
    }
}

impl From<DeviceType> for Classification {
    fn from(device: DeviceType) -> Self {
        match device {
            DeviceType::Ping1D => Classification::Ping1D,
            DeviceType::Ping360 => Classification::Ping360,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_type() {
            Some(device) => write!(f, "{}", device),
            None => write!(f, "unknown"),
        }
    }
}

/// Classify a stream by its first recognized message id
///
/// The stream must be unfiltered. A decode error ends the scan with
/// `Unknown`; it is logged, not returned.
pub fn classify<I>(records: I) -> Classification
where
    I: IntoIterator<Item = Result<LogRecord>>,
{
    for (index, record) in records.into_iter().enumerate() {
        match record {
            Ok(record) => {
                let classification = Classification::from_message_id(record.message_id());
                if classification != Classification::Unknown {
                    log::debug!(
                        "Message {} at record {} identifies a {}",
                        record.message_id(),
                        index,
                        classification
                    );
                    return classification;
                }
            }
            Err(e) => {
                log::warn!("Decode error while classifying (record {}): {}", index, e);
                return Classification::Unknown;
            }
        }
    }
    Classification::Unknown
}
