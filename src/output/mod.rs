//! Output formatters for device rows and snapshots.
//!
//! Rows are printed one line each while capturing ([`line`]); a whole
//! session can be exported as JSON once capture ends ([`json`]).

pub mod json;
pub mod line;

use crate::window::DeviceRow;

/// Trait for formatting device rows into output lines.
pub trait RowFormatter: Send + Sync {
    /// Format one row. `timestamp_nanos` is the capture time of the frame
    /// that produced it, if it should be written out.
    fn format(&self, row: &DeviceRow, timestamp_nanos: Option<i64>) -> String;
}
