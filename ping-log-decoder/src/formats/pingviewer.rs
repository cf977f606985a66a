//! Ping Viewer binary log parser
//!
//! Ping Viewer records sensor traffic into `.bin` files laid out as Qt data
//! streams (all integers big-endian):
//!
//! - Header: identifier string, `i32` format version, then build hash, build
//!   date, tag, OS name and OS version strings
//! - Records until end of file: timestamp string, message byte array
//!
//! Strings and byte arrays are a `u32` byte length followed by the bytes.
//! Strings are stored as UTF-16, so decoding them as UTF-8 leaves a null byte
//! in front of every ASCII character. Record timestamps are returned with that
//! padding intact; header strings are cleaned.
//!
//! ## Known Limitations
//! - A record cut off by the end of the file (recording interrupted) ends the
//!   stream with a warning instead of an error
//! - Only the first valid Ping frame in a record is decoded

use super::ping_protocol;
use super::MessageSource;
use crate::types::{DecoderError, LogRecord, Result};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Length value marking a null string / byte array
const NULL_LEN: u32 = 0xFFFF_FFFF;

/// Largest length accepted before the file is considered corrupt
const MAX_ARRAY_LEN: u32 = 0x00FF_FFFF;

/// Ping Viewer file header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogHeader {
    pub identifier: String,
    pub version: i32,
    pub hash_commit: String,
    pub date: String,
    pub tag: String,
    pub os_name: String,
    pub os_version: String,
}

/// Iterator over decoded records of a Ping Viewer log
pub struct PingViewerLog {
    reader: BufReader<File>,
    path: PathBuf,
    header: LogHeader,
    filter: Option<Vec<u16>>,
    records_read: usize,
    finished: bool,
}

fn strip_padding(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "")
}

/// Read until `buf` is full or the reader is exhausted, returning the count
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl PingViewerLog {
    /// Header read when the file was opened
    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// Number of container records consumed so far, filtered or not
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read `len` bytes; `None` if the file ends first
    fn read_bytes(&mut self, len: u32) -> Result<Option<Vec<u8>>> {
        if len == NULL_LEN {
            return Ok(Some(Vec::new()));
        }
        if len > MAX_ARRAY_LEN {
            return Err(DecoderError::LogParse(format!(
                "corrupt length {:#X} after {} records in {:?}",
                len, self.records_read, self.path
            )));
        }
        let mut buf = vec![0u8; len as usize];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(DecoderError::path(&self.path, e)),
        }
    }

    /// Read a length-prefixed array; `None` if the file ends first
    fn read_array(&mut self) -> Result<Option<Vec<u8>>> {
        match self.reader.read_u32::<BigEndian>() {
            Ok(len) => self.read_bytes(len),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(DecoderError::path(&self.path, e)),
        }
    }

    fn read_header_string(&mut self, field: &str) -> Result<String> {
        match self.read_array()? {
            Some(bytes) => Ok(strip_padding(&bytes)),
            None => Err(DecoderError::LogParse(format!(
                "header of {:?} truncated before {}",
                self.path, field
            ))),
        }
    }

    fn read_header(&mut self) -> Result<LogHeader> {
        let identifier = self.read_header_string("identifier")?;
        let version = self.reader.read_i32::<BigEndian>().map_err(|e| {
            DecoderError::LogParse(format!("header of {:?} truncated before version: {}", self.path, e))
        })?;
        Ok(LogHeader {
            identifier,
            version,
            hash_commit: self.read_header_string("hash commit")?,
            date: self.read_header_string("date")?,
            tag: self.read_header_string("tag")?,
            os_name: self.read_header_string("OS name")?,
            os_version: self.read_header_string("OS version")?,
        })
    }

    /// Read the next container record as (raw timestamp, message bytes)
    ///
    /// Returns `None` at the end of the file.
    fn read_record(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        let mut len_buf = [0u8; 4];
        match fill(&mut self.reader, &mut len_buf).map_err(|e| DecoderError::path(&self.path, e))? {
            0 => return Ok(None),
            4 => {}
            _ => {
                self.warn_truncated();
                return Ok(None);
            }
        }

        let timestamp = match self.read_bytes(BigEndian::read_u32(&len_buf))? {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => {
                self.warn_truncated();
                return Ok(None);
            }
        };
        let message = match self.read_array()? {
            Some(bytes) => bytes,
            None => {
                self.warn_truncated();
                return Ok(None);
            }
        };

        self.records_read += 1;
        Ok(Some((timestamp, message)))
    }

    fn warn_truncated(&self) {
        log::warn!(
            "Log {:?} ends inside a record after {} complete records",
            self.path,
            self.records_read
        );
    }
}

impl MessageSource for PingViewerLog {
    fn open(path: &Path) -> Result<Self> {
        log::info!("Opening Ping Viewer log: {:?}", path);

        let file = File::open(path).map_err(|e| DecoderError::path(path, e))?;
        let mut source = PingViewerLog {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            header: LogHeader::default(),
            filter: None,
            records_read: 0,
            finished: false,
        };
        source.header = source.read_header()?;

        log::debug!(
            "Log header: {:?} v{} ({} on {} {})",
            source.header.identifier,
            source.header.version,
            source.header.tag,
            source.header.os_name,
            source.header.os_version
        );
        Ok(source)
    }

    fn with_message_filter(mut self, ids: &[u16]) -> Self {
        self.filter = Some(ids.to_vec());
        self
    }
}

impl Iterator for PingViewerLog {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let (timestamp_offset, bytes) = match self.read_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.finished = true;
                    log::debug!("Finished {:?}: {} records", self.path, self.records_read);
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            let frame = match ping_protocol::find_frame(&bytes) {
                Some(frame) => frame,
                None => {
                    log::debug!(
                        "No valid Ping frame in record {} of {:?}, skipping",
                        self.records_read,
                        self.path
                    );
                    continue;
                }
            };

            if let Some(ids) = &self.filter {
                if !ids.contains(&frame.message_id) {
                    continue;
                }
            }

            return Some(frame.decode().map(|message| LogRecord {
                timestamp_offset,
                message,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;
    use std::io::Write;
    use tempfile::NamedTempFile;

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

    fn header() -> Vec<u8> {
        let mut out = qt_string("PingViewer sensor log file");
        out.extend_from_slice(&1i32.to_be_bytes());
        for s in ["abc123", "Mar 6 2025", "v2.4.0", "linux", "6.1"] {
            out.extend(qt_string(s));
        }
        out
    }

    fn write_log(body: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&header()).unwrap();
        file.write_all(body).unwrap();
        file.flush().unwrap();
        file
    }

    fn record(ts: &str, frame: &[u8]) -> Vec<u8> {
        let mut out = qt_string(ts);
        out.extend(qt_bytes(frame));
        out
    }

    #[test]
    fn test_file_not_found() {
        let result = PingViewerLog::open(Path::new("nonexistent.bin"));
        assert!(matches!(result, Err(DecoderError::Path { .. })));
    }

    #[test]
    fn test_header_and_padded_timestamps() {
        let frame = ping_protocol::encode_frame(1212, 1, 0, &[10, 0, 0, 0, 99]);
        let file = write_log(&record("00:00:01.500", &frame));

        let mut log = PingViewerLog::open(file.path()).unwrap();
        assert_eq!(log.header().identifier, "PingViewer sensor log file");
        assert_eq!(log.header().version, 1);
        assert_eq!(log.header().os_name, "linux");

        let rec = log.next().unwrap().unwrap();
        assert!(rec.timestamp_offset.contains('\0'));
        assert_eq!(rec.timestamp_offset.replace('\0', ""), "00:00:01.500");
        assert_eq!(rec.message_id(), 1212);
        assert!(log.next().is_none());
        assert_eq!(log.records_read(), 1);
    }

    #[test]
    fn test_filter_drops_other_ids() {
        let mut body = record("00:00:00.1", &ping_protocol::encode_frame(5, 1, 0, &[1]));
        body.extend(record("00:00:00.2", &ping_protocol::encode_frame(1212, 1, 0, &[1, 0, 0, 0, 2])));
        let file = write_log(&body);

        let ids: Vec<u16> = PingViewerLog::open(file.path())
            .unwrap()
            .with_message_filter(&[1212])
            .map(|r| r.unwrap().message_id())
            .collect();
        assert_eq!(ids, vec![1212]);
    }

    #[test]
    fn test_filter_skips_decoding_of_unselected_ids() {
        // A malformed 2300 payload is never decoded when only 1212 is requested
        let mut body = record("00:00:00.1", &ping_protocol::encode_frame(2300, 1, 0, &[1, 2]));
        body.extend(record("00:00:00.2", &ping_protocol::encode_frame(1212, 1, 0, &[1, 0, 0, 0, 2])));
        let file = write_log(&body);

        let log = PingViewerLog::open(file.path()).unwrap().with_message_filter(&[1212]);
        assert!(log.into_iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_record_without_frame_is_skipped() {
        let mut body = record("00:00:00.1", b"not a frame");
        body.extend(record("00:00:00.2", &ping_protocol::encode_frame(7, 1, 0, &[3])));
        let file = write_log(&body);

        let records: Vec<_> = PingViewerLog::open(file.path()).unwrap().collect();
        assert_eq!(records.len(), 1);
        let rec = records[0].as_ref().unwrap();
        assert_eq!(rec.message.payload, Payload::Other(vec![3]));
    }

    #[test]
    fn test_truncated_tail_ends_stream() {
        let mut body = record("00:00:00.1", &ping_protocol::encode_frame(7, 1, 0, &[3]));
        let second = record("00:00:00.2", &ping_protocol::encode_frame(7, 1, 0, &[4]));
        body.extend_from_slice(&second[..second.len() - 4]);
        let file = write_log(&body);

        let records: Vec<_> = PingViewerLog::open(file.path()).unwrap().collect();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_ok());
    }

    #[test]
    fn test_corrupt_length_is_parse_error() {
        let mut body = record("00:00:00.1", &ping_protocol::encode_frame(7, 1, 0, &[3]));
        body.extend_from_slice(&0x7000_0000u32.to_be_bytes());
        let file = write_log(&body);

        let records: Vec<_> = PingViewerLog::open(file.path()).unwrap().collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[1], Err(DecoderError::LogParse(_))));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&qt_string("PingViewer sensor log file")).unwrap();
        file.flush().unwrap();

        let result = PingViewerLog::open(file.path());
        assert!(matches!(result, Err(DecoderError::LogParse(_))));
    }
}
