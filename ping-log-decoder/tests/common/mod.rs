//! Fixture recordings for integration tests
#![allow(dead_code)]

use ping_log_decoder::formats::ping_protocol::encode_frame;
use std::path::Path;

fn qt_string(s: &str) -> Vec<u8> {
    let utf16: Vec<u8> = s.encode_utf16().flat_map(|c| c.to_be_bytes()).collect();
    let mut out = (utf16.len() as u32).to_be_bytes().to_vec();
    out.extend(utf16);
    out
}

fn qt_bytes(b: &[u8]) -> Vec<u8> {
    let mut out = (b.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(b);
    out
}

/// Payload of a Ping1D `profile` (1300) message
pub fn ping1d_profile_payload(distance: u32, confidence: u16, ping_number: u32, profile: &[u8]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&distance.to_le_bytes());
    p.extend_from_slice(&confidence.to_le_bytes());
    p.extend_from_slice(&100u16.to_le_bytes()); // transmit_duration
    p.extend_from_slice(&ping_number.to_le_bytes());
    p.extend_from_slice(&0u32.to_le_bytes()); // scan_start
    p.extend_from_slice(&10_000u32.to_le_bytes()); // scan_length
    p.extend_from_slice(&3u32.to_le_bytes()); // gain_setting
    p.extend_from_slice(&(profile.len() as u16).to_le_bytes());
    p.extend_from_slice(profile);
    p
}

/// Payload of a Ping360 `device_data` (2300) message
pub fn device_data_payload(angle: u16, sample_period: u16, data: &[u8]) -> Vec<u8> {
    let mut p = vec![0u8, 1]; // mode, gain_setting
    for v in [angle, 32, sample_period, 750, data.len() as u16, data.len() as u16] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    p.extend_from_slice(data);
    p
}

/// Builds a Ping Viewer `.bin` recording in memory
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        let mut bytes = qt_string("PingViewer sensor log file");
        bytes.extend_from_slice(&1i32.to_be_bytes());
        for s in ["0123abcd", "Thu Mar 6 2025", "v2.4.1", "linux", "6.1"] {
            bytes.extend(qt_string(s));
        }
        Self { bytes }
    }

    /// Append a record holding one framed message
    pub fn message(mut self, offset: &str, message_id: u16, payload: &[u8]) -> Self {
        self.bytes.extend(qt_string(offset));
        self.bytes.extend(qt_bytes(&encode_frame(message_id, 1, 0, payload)));
        self
    }

    pub fn ping1d_profile(self, offset: &str, distance: u32, confidence: u16, ping_number: u32) -> Self {
        let payload = ping1d_profile_payload(distance, confidence, ping_number, &[1, 2, 3, 4]);
        self.message(offset, 1300, &payload)
    }

    pub fn device_data(self, offset: &str, angle: u16, sample_period: u16, data: &[u8]) -> Self {
        let payload = device_data_payload(angle, sample_period, data);
        self.message(offset, 2300, &payload)
    }

    /// Append raw bytes after the last record
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, &self.bytes).unwrap();
    }
}
