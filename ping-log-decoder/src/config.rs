//! Decoder configuration types
//!
//! This module holds the conversion constants and message id selection used by
//! the decoder, and the injected directory layout used when sorting recordings.

use crate::types::{DecoderError, DeviceType, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Speed of sound in water, m/s
pub const SPEED_OF_SOUND_M_S: f64 = 1500.0;

/// Degrees per gradian (400 gradians = 360 degrees)
pub const GRADIANS_TO_DEGREES: f64 = 0.9;

/// Duration of one Ping360 sample period tick, seconds
pub const SAMPLE_TICK_S: f64 = 25e-9;

/// Ping1D `profile` message id
pub const PING1D_PROFILE_ID: u16 = 1300;

/// Ping360 `device_data` message id
pub const PING360_DEVICE_DATA_ID: u16 = 2300;

/// Physical constants used to turn raw Ping360 fields into engineering units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SonarConstants {
    /// Speed of sound in the medium (m/s)
    #[serde(default = "default_speed_of_sound")]
    pub speed_of_sound_m_s: f64,

    /// Conversion factor from gradians to degrees
    #[serde(default = "default_gradians_to_degrees")]
    pub gradians_to_degrees: f64,

    /// Length of one sample period tick (s)
    #[serde(default = "default_sample_tick")]
    pub sample_tick_s: f64,
}

fn default_speed_of_sound() -> f64 {
    SPEED_OF_SOUND_M_S
}

fn default_gradians_to_degrees() -> f64 {
    GRADIANS_TO_DEGREES
}

fn default_sample_tick() -> f64 {
    SAMPLE_TICK_S
}

impl Default for SonarConstants {
    fn default() -> Self {
        Self {
            speed_of_sound_m_s: SPEED_OF_SOUND_M_S,
            gradians_to_degrees: GRADIANS_TO_DEGREES,
            sample_tick_s: SAMPLE_TICK_S,
        }
    }
}

impl SonarConstants {
    /// Convert a raw head angle in gradians to degrees
    pub fn angle_degrees(&self, raw_angle: u16) -> f64 {
        raw_angle as f64 * self.gradians_to_degrees
    }

    /// One-way range covered by a single sample
    ///
    /// The sample period measures round-trip time, hence the halving.
    pub fn distance_per_sample(&self, sample_period: u16) -> f64 {
        let sample_time_s = sample_period as f64 * self.sample_tick_s;
        (self.speed_of_sound_m_s * sample_time_s) / 2.0
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Message ids converted by the Ping1D (point) pipeline
    #[serde(default = "default_point_ids")]
    pub point_message_ids: Vec<u16>,

    /// Message ids converted by the Ping360 (profile) pipeline
    #[serde(default = "default_profile_ids")]
    pub profile_message_ids: Vec<u16>,

    /// Unit conversion constants
    #[serde(default)]
    pub constants: SonarConstants,
}

fn default_point_ids() -> Vec<u16> {
    vec![PING1D_PROFILE_ID]
}

fn default_profile_ids() -> Vec<u16> {
    vec![PING360_DEVICE_DATA_ID]
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            point_message_ids: default_point_ids(),
            profile_message_ids: default_profile_ids(),
            constants: SonarConstants::default(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the message ids converted by the point pipeline
    pub fn with_point_ids(mut self, ids: Vec<u16>) -> Self {
        self.point_message_ids = ids;
        self
    }

    /// Builder method: set the message ids converted by the profile pipeline
    pub fn with_profile_ids(mut self, ids: Vec<u16>) -> Self {
        self.profile_message_ids = ids;
        self
    }

    /// Builder method: override the speed of sound
    pub fn with_speed_of_sound(mut self, speed_m_s: f64) -> Self {
        self.constants.speed_of_sound_m_s = speed_m_s;
        self
    }

    /// Message ids consumed by the pipeline for a device type
    pub fn message_ids(&self, device: DeviceType) -> &[u16] {
        match device {
            DeviceType::Ping1D => &self.point_message_ids,
            DeviceType::Ping360 => &self.profile_message_ids,
        }
    }

    /// Reject configurations the pipelines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.point_message_ids.is_empty() || self.profile_message_ids.is_empty() {
            return Err(DecoderError::InvalidConfig(
                "message id lists must not be empty".to_string(),
            ));
        }
        if let Some(id) = self
            .point_message_ids
            .iter()
            .find(|id| self.profile_message_ids.contains(id))
        {
            return Err(DecoderError::InvalidConfig(format!(
                "message id {} is assigned to both pipelines",
                id
            )));
        }
        let c = &self.constants;
        if !(c.speed_of_sound_m_s > 0.0 && c.sample_tick_s > 0.0 && c.gradians_to_degrees > 0.0) {
            return Err(DecoderError::InvalidConfig(
                "conversion constants must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Destination directory per recognized device type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destinations {
    pub ping1d: PathBuf,
    pub ping360: PathBuf,
}

impl Destinations {
    /// Directory that receives recordings of the given device type
    pub fn for_device(&self, device: DeviceType) -> &Path {
        match device {
            DeviceType::Ping1D => &self.ping1d,
            DeviceType::Ping360 => &self.ping360,
        }
    }
}

/// Directory layout for classify-and-relocate runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Directory scanned for `.bin` recordings
    pub input_dir: PathBuf,
    pub destinations: Destinations,
}

impl SortConfig {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        ping1d_dir: impl Into<PathBuf>,
        ping360_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            destinations: Destinations {
                ping1d: ping1d_dir.into(),
                ping360: ping360_dir.into(),
            },
        }
    }
}
