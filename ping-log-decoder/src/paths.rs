//! Output path resolution
//!
//! Recordings are usually kept under a `bin/` directory with tables next to it
//! in `csv/`:
//!
//! ```text
//! survey/bin/20250306-115328280.bin  ->  survey/csv/20250306-115328280.csv
//! ```

use std::path::{Path, PathBuf};

/// Directory name that marks raw recordings
pub const RAW_DIR_NAME: &str = "bin";

/// Sibling directory receiving tables
pub const TABLE_DIR_NAME: &str = "csv";

/// Table file extension
pub const TABLE_EXTENSION: &str = "csv";

/// Log file extension scanned by batch runs
pub const LOG_EXTENSION: &str = "bin";

/// Pick the table path for an input recording
///
/// Precedence: `explicit`, then the `csv/` sibling of a `bin/` directory, then
/// `default_name`, then the input path with a `.csv` extension.
pub fn resolve_output_path(input: &Path, explicit: Option<&Path>, default_name: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let (Some(parent), Some(stem)) = (input.parent(), input.file_stem()) {
        let in_raw_dir = parent
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.eq_ignore_ascii_case(RAW_DIR_NAME))
            .unwrap_or(false);
        if in_raw_dir {
            let base = parent.parent().unwrap_or_else(|| Path::new(""));
            let mut file = stem.to_os_string();
            file.push(".");
            file.push(TABLE_EXTENSION);
            return base.join(TABLE_DIR_NAME).join(file);
        }
    }

    match default_name {
        Some(name) => name.to_path_buf(),
        None => input.with_extension(TABLE_EXTENSION),
    }
}

/// True for files a batch run should pick up
pub fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(LOG_EXTENSION))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let out = resolve_output_path(
            Path::new("survey/bin/20250306-115328280.bin"),
            Some(Path::new("custom.csv")),
            Some(Path::new("output.csv")),
        );
        assert_eq!(out, PathBuf::from("custom.csv"));
    }

    #[test]
    fn test_bin_directory_maps_to_csv_sibling() {
        let out = resolve_output_path(Path::new("survey/bin/20250306-115328280.bin"), None, None);
        assert_eq!(out, PathBuf::from("survey/csv/20250306-115328280.csv"));

        let upper = resolve_output_path(Path::new("/data/BIN/20250306-115328280.bin"), None, None);
        assert_eq!(upper, PathBuf::from("/data/csv/20250306-115328280.csv"));
    }

    #[test]
    fn test_dotted_stem_is_kept_whole() {
        let out = resolve_output_path(Path::new("survey/bin/run.v2.bin"), None, None);
        assert_eq!(out, PathBuf::from("survey/csv/run.v2.csv"));
    }

    #[test]
    fn test_relative_bin_directory() {
        let out = resolve_output_path(Path::new("bin/20250306-115328280.bin"), None, None);
        assert_eq!(out, PathBuf::from("csv/20250306-115328280.csv"));
    }

    #[test]
    fn test_default_name_then_beside_input() {
        let input = Path::new("logs/20250306-115328280.bin");
        assert_eq!(
            resolve_output_path(input, None, Some(Path::new("output.csv"))),
            PathBuf::from("output.csv")
        );
        assert_eq!(
            resolve_output_path(input, None, None),
            PathBuf::from("logs/20250306-115328280.csv")
        );
    }

    #[test]
    fn test_is_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("20250306-115328280.BIN");
        let other = dir.path().join("notes.txt");
        std::fs::write(&log, b"").unwrap();
        std::fs::write(&other, b"").unwrap();

        assert!(is_log_file(&log));
        assert!(!is_log_file(&other));
        assert!(!is_log_file(dir.path()));
    }
}
