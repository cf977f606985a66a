//! Batch processing over directories of recordings
//!
//! Both modes run files strictly one after another and isolate failures: an
//! error on one file is logged and recorded in the [`BatchReport`], and the
//! loop moves on to the next file.

use crate::config::SortConfig;
use crate::decoder::Decoder;
use crate::paths;
use crate::types::{DecoderError, DeviceType, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How convert-all picks the pipeline for each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertMode {
    /// Every file is converted as this device type
    Fixed(DeviceType),
    /// Each file is classified first (second, independent read)
    Auto,
}

/// Broad cause of a per-file failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Unreadable content: log structure, payload, timestamp or file name
    Parse,
    /// Filesystem access: input, output or destination
    Path,
    Other,
}

impl From<&DecoderError> for FailureKind {
    fn from(e: &DecoderError) -> Self {
        if e.is_parse_error() {
            FailureKind::Parse
        } else if matches!(e, DecoderError::Path { .. } | DecoderError::Io(_)) {
            FailureKind::Path
        } else {
            FailureKind::Other
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Converted {
        device: DeviceType,
        output: PathBuf,
        messages: usize,
        rows: usize,
    },
    Moved {
        device: DeviceType,
        destination: PathBuf,
    },
    /// No recognized message id; the file was left alone
    Unclassified,
    Failed {
        kind: FailureKind,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Per-file outcomes of a batch run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    fn push(&mut self, path: &Path, status: FileStatus) {
        self.outcomes.push(FileOutcome {
            path: path.to_path_buf(),
            status,
        });
    }

    /// Files converted or moved
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Converted { .. } | FileStatus::Moved { .. }))
            .count()
    }

    pub fn unclassified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FileStatus::Unclassified)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// List the recordings of a directory in lexical order
pub fn list_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| DecoderError::path(dir, e))?;
    let mut logs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DecoderError::path(dir, e))?.path();
        if paths::is_log_file(&path) {
            logs.push(path);
        }
    }
    logs.sort();
    Ok(logs)
}

/// Move a file into `dest_dir`, creating the directory if needed
///
/// Falls back to copy + remove when a rename is refused (e.g. across
/// filesystems).
pub fn relocate(path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir).map_err(|e| DecoderError::path(dest_dir, e))?;
    let name = path
        .file_name()
        .ok_or_else(|| DecoderError::InvalidData(format!("{:?} has no file name", path)))?;
    let dest = dest_dir.join(name);

    if let Err(rename_err) = fs::rename(path, &dest) {
        log::debug!("Rename of {:?} failed ({}), copying instead", path, rename_err);
        fs::copy(path, &dest).map_err(|e| DecoderError::path(&dest, e))?;
        fs::remove_file(path).map_err(|e| DecoderError::path(path, e))?;
    }
    Ok(dest)
}

/// Runs the decoder over every recording of a directory
pub struct BatchDispatcher<'a> {
    decoder: &'a Decoder,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(decoder: &'a Decoder) -> Self {
        Self { decoder }
    }

    fn record_failure(report: &mut BatchReport, path: &Path, e: DecoderError) {
        log::error!("Error processing {:?}: {}", path, e);
        report.push(
            path,
            FileStatus::Failed {
                kind: FailureKind::from(&e),
                error: e.to_string(),
            },
        );
    }

    fn convert_one(&self, path: &Path, mode: ConvertMode, output: &Path) -> Result<FileStatus> {
        let device = match mode {
            ConvertMode::Fixed(device) => device,
            ConvertMode::Auto => match self.decoder.classify_file(path).device_type() {
                Some(device) => device,
                None => return Ok(FileStatus::Unclassified),
            },
        };

        let summary = self.decoder.convert(device, path, output)?;
        Ok(FileStatus::Converted {
            device,
            output: summary.output,
            messages: summary.messages,
            rows: summary.rows,
        })
    }

    /// Convert every recording in `dir`
    ///
    /// `output_for` maps each input to its table path. Only a failure to list
    /// `dir` is returned as an error.
    pub fn convert_all<F>(&self, dir: &Path, mode: ConvertMode, output_for: F) -> Result<BatchReport>
    where
        F: Fn(&Path) -> PathBuf,
    {
        let logs = list_logs(dir)?;
        log::info!("Converting {} recordings in {:?}", logs.len(), dir);

        let mut report = BatchReport::default();
        for path in &logs {
            let output = output_for(path);
            log::info!("Processing {:?} -> {:?}", path, output);

            match self.convert_one(path, mode, &output) {
                Ok(FileStatus::Unclassified) => {
                    log::warn!("Could not determine device type for {:?}, skipping", path);
                    report.push(path, FileStatus::Unclassified);
                }
                Ok(status) => report.push(path, status),
                Err(e) => Self::record_failure(&mut report, path, e),
            }
        }

        log::info!(
            "Batch finished: {} converted, {} unclassified, {} failed",
            report.succeeded(),
            report.unclassified(),
            report.failed()
        );
        Ok(report)
    }

    /// Move every recognized recording of `config.input_dir` into the
    /// destination for its device type
    ///
    /// Unrecognized files stay where they are.
    pub fn sort_all(&self, config: &SortConfig) -> Result<BatchReport> {
        let logs = list_logs(&config.input_dir)?;
        log::info!("Sorting {} recordings in {:?}", logs.len(), config.input_dir);

        let mut report = BatchReport::default();
        for path in &logs {
            let Some(device) = self.decoder.classify_file(path).device_type() else {
                log::warn!("Could not determine file type for {:?}", path);
                report.push(path, FileStatus::Unclassified);
                continue;
            };

            let dest_dir = config.destinations.for_device(device);
            match relocate(path, dest_dir) {
                Ok(destination) => {
                    log::info!("Moved {:?} to {:?}", path, dest_dir);
                    report.push(path, FileStatus::Moved { device, destination });
                }
                Err(e) => Self::record_failure(&mut report, path, e),
            }
        }

        log::info!(
            "Sort finished: {} moved, {} unclassified, {} failed",
            report.succeeded(),
            report.unclassified(),
            report.failed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_logs_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.bin", "a.bin", "c.txt", "d.BIN"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.bin")).unwrap();

        let names: Vec<String> = list_logs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin", "d.BIN"]);
    }

    #[test]
    fn test_list_missing_dir_is_path_error() {
        let result = list_logs(Path::new("/nonexistent/ping/logs"));
        assert!(matches!(result, Err(DecoderError::Path { .. })));
    }

    #[test]
    fn test_relocate_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("20250306-115328280.bin");
        fs::write(&src, b"data").unwrap();

        let dest = relocate(&src, &dir.path().join("sorted").join("1D")).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"data");
    }

    #[test]
    fn test_unreadable_files_stay_unclassified() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("20250306-115328280.bin");
        fs::write(&src, b"garbage").unwrap();
        let config = SortConfig::new(dir.path(), dir.path().join("1D"), dir.path().join("360"));

        let decoder = Decoder::new();
        let report = BatchDispatcher::new(&decoder).sort_all(&config).unwrap();
        assert_eq!(report.unclassified(), 1);
        assert_eq!(report.failed(), 0);
        assert!(src.exists());
        assert!(!dir.path().join("1D").exists());
    }

    #[test]
    fn test_report_json() {
        let mut report = BatchReport::default();
        report.push(Path::new("a.bin"), FileStatus::Unclassified);
        report.push(
            Path::new("b.bin"),
            FileStatus::Failed {
                kind: FailureKind::Parse,
                error: "bad".to_string(),
            },
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "unclassified");
        assert_eq!(json["outcomes"][1]["kind"], "parse");
        assert_eq!(json["outcomes"][1]["path"], "b.bin");
        assert_eq!(report.failed(), 1);
    }
}
