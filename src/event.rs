//! Events delivered by capture backends.

use crate::frame::AdvertisementFrame;
use crate::side_channel::{GpsFix, WifiNetwork};
use serde::{Deserialize, Serialize};

/// One item from a capture backend.
///
/// Externally tagged so capture files can interleave event kinds, one per line:
/// `{"ble": {"address": "..", "timestampNanos": .., "rssi": ..}}`,
/// `{"wifi": [..]}` or `{"gps": {"lat": .., "lon": .., "acc": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureEvent {
    #[serde(rename = "ble")]
    Advertisement(AdvertisementFrame),
    /// Results of one Wi-Fi scan; may be empty
    Wifi(Vec<WifiNetwork>),
    Gps(GpsFix),
}
