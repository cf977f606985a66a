//! Log file format parsers
//!
//! This module contains the Ping Viewer log container reader and the Ping
//! protocol framer used to decode the messages stored in it.

use crate::types::{LogRecord, Result};
use std::path::Path;

pub mod ping_protocol;
pub mod pingviewer;

// Re-export parser types
pub use pingviewer::{LogHeader, PingViewerLog};

/// Common trait for message sources
///
/// A source yields (raw relative timestamp, decoded message) records lazily,
/// in file order. It is forward-only: reading a file twice means opening it
/// twice.
pub trait MessageSource: Iterator<Item = Result<LogRecord>> + Sized {
    /// Open a log file and read its header
    fn open(path: &Path) -> Result<Self>;

    /// Only yield records whose message id is in `ids`
    ///
    /// Records with other ids are dropped before their payload is decoded.
    fn with_message_filter(self, ids: &[u16]) -> Self;
}
