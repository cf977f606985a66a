//! CSV table output
//!
//! A [`TableSink`] writes the header for one row type up front, so even a log
//! without qualifying messages produces a well-formed (header-only) table.

use crate::types::{DecoderError, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A row type with a fixed column layout
pub trait TableRow: Serialize {
    /// Column names, in serialization order
    const COLUMNS: &'static [&'static str];
}

impl TableRow for crate::records::PointRow {
    const COLUMNS: &'static [&'static str] = &crate::records::POINT_COLUMNS;
}

impl TableRow for crate::records::ProfileRow {
    const COLUMNS: &'static [&'static str] = &crate::records::PROFILE_COLUMNS;
}

/// Ordered writer of rows of a single type
pub struct TableSink<W: Write, R: TableRow> {
    writer: csv::Writer<W>,
    /// Output file, when the sink writes to one
    path: Option<PathBuf>,
    rows: usize,
    _row: PhantomData<R>,
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| DecoderError::path(parent, e))?;
        }
    }
    Ok(())
}

impl<R: TableRow> TableSink<BufWriter<File>, R> {
    /// Create (or truncate) a table file, creating its directory if needed
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent_dirs(path)?;
        let file = File::create(path).map_err(|e| DecoderError::path(path, e))?;
        Self::with_path(BufWriter::new(file), Some(path.to_path_buf()))
    }
}

impl<W: Write, R: TableRow> TableSink<W, R> {
    /// Wrap a writer and emit the header line
    pub fn new(inner: W) -> Result<Self> {
        Self::with_path(inner, None)
    }

    fn with_path(inner: W, path: Option<PathBuf>) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        let mut sink = Self {
            writer,
            path,
            rows: 0,
            _row: PhantomData,
        };
        let header = sink.writer.write_record(R::COLUMNS);
        header.map_err(|e| sink.csv_error(e))?;
        Ok(sink)
    }

    /// Write failures are filesystem errors on the output path
    fn io_error(&self, e: std::io::Error) -> DecoderError {
        match &self.path {
            Some(path) => DecoderError::path(path, e),
            None => DecoderError::Io(e),
        }
    }

    fn csv_error(&self, e: csv::Error) -> DecoderError {
        if !e.is_io_error() {
            return DecoderError::Csv(e);
        }
        match e.into_kind() {
            csv::ErrorKind::Io(io) => self.io_error(io),
            kind => DecoderError::InvalidData(format!("{:?}", kind)),
        }
    }

    pub fn write_row(&mut self, row: &R) -> Result<()> {
        let written = self.writer.serialize(row);
        written.map_err(|e| self.csv_error(e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_rows<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Data rows written so far (header excluded)
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        let flushed = self.writer.flush();
        flushed.map_err(|e| self.io_error(e))
    }

    /// Flush everything down to the underlying writer and return it
    pub fn finish(self) -> Result<W> {
        let path = self.path;
        let to_error = |e: std::io::Error| match &path {
            Some(p) => DecoderError::path(p, e),
            None => DecoderError::Io(e),
        };
        let mut inner = self.writer.into_inner().map_err(|e| to_error(e.into_error()))?;
        inner.flush().map_err(to_error)?;
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{PointRow, ProfileRow};
    use chrono::NaiveDate;

    fn real_time() -> crate::types::Timestamp {
        NaiveDate::from_ymd_opt(2025, 3, 6)
            .unwrap()
            .and_hms_micro_opt(11, 53, 29, 780_000)
            .unwrap()
    }

    fn point(distance: Option<u32>, gain: Option<u32>) -> PointRow {
        PointRow {
            real_time: real_time(),
            timestamp_offset: "00:00:01.500000".to_string(),
            message_id: 1300,
            distance,
            confidence: Some(99),
            transmit_duration: None,
            ping_number: Some(4),
            scan_start: None,
            scan_length: None,
            gain_setting: gain,
            profile_data_length: None,
        }
    }

    fn to_string<R: TableRow>(rows: &[R]) -> String {
        let mut sink = TableSink::<Vec<u8>, R>::new(Vec::new()).unwrap();
        sink.write_rows(rows).unwrap();
        assert_eq!(sink.rows_written(), rows.len());
        String::from_utf8(sink.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_header_only_when_empty() {
        let out = to_string::<PointRow>(&[]);
        assert_eq!(
            out,
            "real_time,timestamp_offset,message_id,distance,confidence,transmit_duration,\
             ping_number,scan_start,scan_length,gain_setting,profile_data_length\n"
        );
    }

    #[test]
    fn test_absent_fields_render_blank() {
        let out = to_string(&[point(Some(1500), None), point(None, Some(6))]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2025-03-06 11:53:29.780000,00:00:01.500000,1300,1500,99,,4,,,,");
        assert_eq!(lines[2], "2025-03-06 11:53:29.780000,00:00:01.500000,1300,,99,,4,,,6,");
    }

    #[test]
    fn test_column_count_is_fixed_for_every_presence_combination() {
        let mut rows = Vec::new();
        for mask in 0..4u8 {
            rows.push(point(
                (mask & 1 != 0).then_some(10),
                (mask & 2 != 0).then_some(20),
            ));
        }
        let out = to_string(&rows);
        for line in out.lines() {
            assert_eq!(line.split(',').count(), PointRow::COLUMNS.len());
        }
    }

    #[test]
    fn test_profile_rows() {
        let row = ProfileRow {
            real_time: real_time(),
            timestamp_offset: "00:00:01.500000".to_string(),
            angle_deg: 90.0,
            sample_index: 1,
            distance_m: 0.01875,
            intensity: 20,
        };
        let out = to_string(&[row]);
        assert_eq!(
            out,
            "real_time,timestamp_offset,angle_deg,sample_index,distance_m,intensity\n\
             2025-03-06 11:53:29.780000,00:00:01.500000,90.0,1,0.01875,20\n"
        );
    }

    /// Accepts nothing, like a full disk
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let mut sink = TableSink::<_, PointRow>::new(FullDisk).unwrap();
        sink.write_row(&point(Some(1), None)).unwrap();
        let err = sink.finish().err().unwrap();
        assert!(matches!(err, DecoderError::Io(_)), "{:?}", err);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_names_output_path() {
        let path = Path::new("/dev/full");
        let mut sink = TableSink::<_, PointRow>::create(path).unwrap();
        let rows: Vec<PointRow> = (0..2000).map(|i| point(Some(i), Some(i))).collect();
        let err = sink
            .write_rows(&rows)
            .and_then(|_| sink.flush())
            .err()
            .unwrap();
        match err {
            DecoderError::Path { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_create_makes_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv").join("out.csv");
        let sink = TableSink::<_, ProfileRow>::create(&path).unwrap();
        sink.finish().unwrap();
        assert!(path.exists());
    }
}
