//! Side-channel observations recorded alongside BLE frames.
//!
//! Wi-Fi scan results and GPS fixes are not processed by the pipeline; the
//! session only keeps the most recent ones so a snapshot can place the BLE
//! capture in context.

use serde::{Deserialize, Serialize};

/// One access point from a Wi-Fi scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    /// Network name; hidden networks have none
    #[serde(default)]
    pub ssid: Option<String>,
    pub bssid: String,
    #[serde(rename = "rssi")]
    pub rssi_dbm: i32,
    #[serde(rename = "freq")]
    pub freq_mhz: u32,
    /// Security capabilities as reported by the scanner, e.g. "[WPA2-PSK-CCMP][ESS]"
    #[serde(default)]
    pub capabilities: Option<String>,
}

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    #[serde(rename = "acc")]
    pub accuracy_m: f32,
}
