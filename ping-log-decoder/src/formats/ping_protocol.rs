//! Ping protocol framing and payload decoding
//!
//! Each Ping Viewer log record carries one serialized Ping protocol frame:
//!
//! ```text
//! 'B' 'R' | payload_length u16 | message_id u16 | src u8 | dst u8 | payload | checksum u16
//! ```
//!
//! All integers are little-endian. The checksum is the wrapping 16-bit sum of
//! every byte before it.

use crate::types::{DecodedMessage, DecoderError, DistanceReading, Payload, Result, SweepStep};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Frame start marker
pub const FRAME_START: [u8; 2] = *b"BR";

/// Bytes before the payload
pub const HEADER_LEN: usize = 8;

/// Trailing checksum bytes
pub const CHECKSUM_LEN: usize = 2;

pub const DISTANCE_SIMPLE_ID: u16 = 1212;
pub const DISTANCE_ID: u16 = 1211;
pub const PROFILE_ID: u16 = 1300;
pub const DEVICE_DATA_ID: u16 = 2300;
pub const AUTO_DEVICE_DATA_ID: u16 = 2301;

/// A validated frame borrowed from a record buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub message_id: u16,
    pub src_device_id: u8,
    pub dst_device_id: u8,
    pub payload: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Decode the payload into a tagged message
    pub fn decode(&self) -> Result<DecodedMessage> {
        Ok(DecodedMessage {
            message_id: self.message_id,
            src_device_id: self.src_device_id,
            dst_device_id: self.dst_device_id,
            payload: decode_payload(self.message_id, self.payload)?,
        })
    }
}

fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, b| acc.wrapping_add(*b as u16))
}

/// Find the first frame with a valid checksum in `buf`
///
/// Bytes before the start marker and frames that fail their checksum are
/// skipped, the same way a streaming parser resynchronizes.
pub fn find_frame(buf: &[u8]) -> Option<RawFrame<'_>> {
    let mut start = 0;
    while start + HEADER_LEN + CHECKSUM_LEN <= buf.len() {
        if buf[start..start + 2] != FRAME_START {
            start += 1;
            continue;
        }

        let payload_len = LittleEndian::read_u16(&buf[start + 2..]) as usize;
        let end = start + HEADER_LEN + payload_len;
        if end + CHECKSUM_LEN > buf.len() {
            log::trace!("Frame at offset {} runs past the record end", start);
            start += 1;
            continue;
        }

        let expected = LittleEndian::read_u16(&buf[end..]);
        if checksum(&buf[start..end]) != expected {
            log::trace!("Checksum mismatch for frame at offset {}", start);
            start += 1;
            continue;
        }

        return Some(RawFrame {
            message_id: LittleEndian::read_u16(&buf[start + 4..]),
            src_device_id: buf[start + 6],
            dst_device_id: buf[start + 7],
            payload: &buf[start + HEADER_LEN..end],
        });
    }
    None
}

/// Serialize a frame, computing length and checksum
///
/// # Panics
///
/// If `payload` is longer than the 16-bit length field allows.
pub fn encode_frame(message_id: u16, src_device_id: u8, dst_device_id: u8, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= u16::MAX as usize,
        "Ping payload of {} bytes exceeds the 65535-byte frame limit",
        payload.len()
    );
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    frame.extend_from_slice(&FRAME_START);
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(&message_id.to_le_bytes());
    frame.push(src_device_id);
    frame.push(dst_device_id);
    frame.extend_from_slice(payload);
    let sum = checksum(&frame);
    frame.extend_from_slice(&sum.to_le_bytes());
    frame
}

/// Reader over a payload that turns short reads into `InvalidData`
struct PayloadReader<'a> {
    id: u16,
    cursor: Cursor<&'a [u8]>,
}

impl<'a> PayloadReader<'a> {
    fn new(id: u16, payload: &'a [u8]) -> Self {
        Self {
            id,
            cursor: Cursor::new(payload),
        }
    }

    fn short(&self) -> DecoderError {
        DecoderError::InvalidData(format!(
            "payload of message {} is too short ({} bytes)",
            self.id,
            self.cursor.get_ref().len()
        ))
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.short())
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor.read_u16::<LittleEndian>().map_err(|_| self.short())
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(|_| self.short())
    }

    /// Remaining bytes of the payload (variable-length trailing array)
    fn rest(&mut self, declared_len: u16) -> Vec<u8> {
        let mut rest = Vec::new();
        // Reading from an in-memory cursor cannot fail
        let _ = self.cursor.read_to_end(&mut rest);
        if rest.len() != declared_len as usize {
            log::debug!(
                "Message {} declares {} data bytes but carries {}",
                self.id,
                declared_len,
                rest.len()
            );
        }
        rest
    }
}

/// Decode a payload according to its message id
pub fn decode_payload(message_id: u16, payload: &[u8]) -> Result<Payload> {
    let mut r = PayloadReader::new(message_id, payload);
    match message_id {
        DISTANCE_SIMPLE_ID => Ok(Payload::Distance(DistanceReading {
            distance: Some(r.u32()?),
            confidence: Some(r.u8()? as u16),
            ..DistanceReading::default()
        })),
        DISTANCE_ID | PROFILE_ID => {
            let mut reading = DistanceReading {
                distance: Some(r.u32()?),
                confidence: Some(r.u16()?),
                transmit_duration: Some(r.u16()?),
                ping_number: Some(r.u32()?),
                scan_start: Some(r.u32()?),
                scan_length: Some(r.u32()?),
                gain_setting: Some(r.u32()?),
                ..DistanceReading::default()
            };
            if message_id == PROFILE_ID {
                let len = r.u16()?;
                reading.profile_data_length = Some(len);
                reading.profile_data = r.rest(len);
            }
            Ok(Payload::Distance(reading))
        }
        DEVICE_DATA_ID | AUTO_DEVICE_DATA_ID => {
            let mode = r.u8()?;
            let gain_setting = r.u8()?;
            let angle = r.u16()?;
            let transmit_duration = r.u16()?;
            let sample_period = r.u16()?;
            let transmit_frequency = r.u16()?;
            if message_id == AUTO_DEVICE_DATA_ID {
                // start_angle, stop_angle, num_steps, delay
                r.u16()?;
                r.u16()?;
                r.u8()?;
                r.u8()?;
            }
            let number_of_samples = r.u16()?;
            let data_length = r.u16()?;
            Ok(Payload::Sweep(SweepStep {
                mode,
                gain_setting,
                angle,
                transmit_duration,
                sample_period,
                transmit_frequency,
                number_of_samples,
                data: r.rest(data_length),
            }))
        }
        _ => Ok(Payload::Other(payload.to_vec())),
    }
}
