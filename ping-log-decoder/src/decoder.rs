//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for opening recordings, classifying
//! them and converting them to tables.

use crate::classifier::{self, Classification};
use crate::config::{DecoderConfig, SonarConstants};
use crate::formats::{MessageSource, PingViewerLog};
use crate::records::{build_point, build_profile, PointRow, ProfileRow, RowStamp};
use crate::sink::TableSink;
use crate::timestamp::OriginTime;
use crate::types::{DeviceType, LogRecord, Payload, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Counts produced while writing one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Qualifying messages consumed
    pub messages: usize,
    /// Data rows written
    pub rows: usize,
}

/// Result of converting one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub device: DeviceType,
    pub messages: usize,
    pub rows: usize,
}

/// Write one point row per qualifying record
///
/// Records whose id is not in `ids` are ignored. The first error aborts the
/// table; rows already written stay in the sink.
pub fn write_point_table<I, W>(
    origin: OriginTime,
    records: I,
    ids: &[u16],
    sink: &mut TableSink<W, PointRow>,
) -> Result<TableStats>
where
    I: IntoIterator<Item = Result<LogRecord>>,
    W: Write,
{
    let mut stats = TableStats::default();
    for record in records {
        let record = record?;
        if !ids.contains(&record.message_id()) {
            continue;
        }
        let stamp = RowStamp::new(origin, &record.timestamp_offset)?;
        sink.write_row(&build_point(&stamp, &record.message))?;
        stats.messages += 1;
        stats.rows += 1;
    }
    Ok(stats)
}

/// Write one profile row per intensity sample of each qualifying record
pub fn write_profile_table<I, W>(
    origin: OriginTime,
    records: I,
    ids: &[u16],
    constants: &SonarConstants,
    sink: &mut TableSink<W, ProfileRow>,
) -> Result<TableStats>
where
    I: IntoIterator<Item = Result<LogRecord>>,
    W: Write,
{
    let mut stats = TableStats::default();
    let mut warned_zero_period = false;
    for record in records {
        let record = record?;
        if !ids.contains(&record.message_id()) {
            continue;
        }
        let sweep = match &record.message.payload {
            Payload::Sweep(sweep) => sweep,
            _ => {
                log::debug!("Message {} carries no scan data, skipping", record.message_id());
                continue;
            }
        };
        if sweep.sample_period == 0 && !warned_zero_period {
            log::warn!("Scan step with zero sample period; its samples all map to 0 m");
            warned_zero_period = true;
        }

        let stamp = RowStamp::new(origin, &record.timestamp_offset)?;
        let rows = build_profile(&stamp, sweep, constants);
        sink.write_rows(&rows)?;
        stats.messages += 1;
        stats.rows += rows.len();
    }
    Ok(stats)
}

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with default message ids and constants
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder from a validated configuration
    pub fn with_config(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Open a recording without filtering
    pub fn open(&self, path: &Path) -> Result<PingViewerLog> {
        PingViewerLog::open(path)
    }

    /// Open a recording yielding only the messages converted for `device`
    ///
    /// # Example
    /// ```no_run
    /// use ping_log_decoder::{Decoder, DeviceType};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new();
    /// let records = decoder
    ///     .decode_file(Path::new("20250306-115328280.bin"), DeviceType::Ping360)
    ///     .unwrap();
    ///
    /// for record in records {
    ///     match record {
    ///         Ok(r) => println!("{} at {:?}", r.message_id(), r.timestamp_offset),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path, device: DeviceType) -> Result<PingViewerLog> {
        Ok(PingViewerLog::open(path)?.with_message_filter(self.config.message_ids(device)))
    }

    /// Classify a recording from its first recognized message
    ///
    /// Failing to open the file also yields `Unknown`, with a diagnostic.
    pub fn classify_file(&self, path: &Path) -> Classification {
        match self.open(path) {
            Ok(source) => classifier::classify(source),
            Err(e) => {
                log::warn!("Cannot classify {:?}: {}", path, e);
                Classification::Unknown
            }
        }
    }

    /// Convert a recording into the table for `device`
    ///
    /// The origin time comes from the input file name. The output directory is
    /// created if needed.
    pub fn convert(&self, device: DeviceType, input: &Path, output: &Path) -> Result<ConversionSummary> {
        log::info!("Converting {:?} ({}) -> {:?}", input, device, output);

        let origin = OriginTime::from_path(input)?;
        let ids = self.config.message_ids(device);
        let records = self.decode_file(input, device)?;

        let stats = match device {
            DeviceType::Ping1D => {
                let mut sink = TableSink::<_, PointRow>::create(output)?;
                let stats = write_point_table(origin, records, ids, &mut sink)?;
                sink.finish()?;
                stats
            }
            DeviceType::Ping360 => {
                let mut sink = TableSink::<_, ProfileRow>::create(output)?;
                let stats = write_profile_table(origin, records, ids, &self.config.constants, &mut sink)?;
                sink.finish()?;
                stats
            }
        };

        log::info!(
            "Wrote {} rows from {} messages to {:?}",
            stats.rows,
            stats.messages,
            output
        );

        Ok(ConversionSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            device,
            messages: stats.messages,
            rows: stats.rows,
        })
    }
}
