//! Point-in-time capture of a session.

use crate::frame::ResolvedAdvertisement;
use crate::side_channel::{GpsFix, WifiNetwork};
use chrono::{DateTime, Utc};

/// Everything a session currently knows, detached from the live window.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Wall-clock time the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Wall-clock time the session started
    pub started_at: DateTime<Utc>,
    /// Whole seconds between session start and the snapshot
    pub elapsed_secs: u64,
    /// Every windowed frame, oldest first
    pub ble: Vec<ResolvedAdvertisement>,
    /// Latest non-empty Wi-Fi scan
    pub wifi: Vec<WifiNetwork>,
    pub gps: Option<GpsFix>,
}
