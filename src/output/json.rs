//! JSON export of a session snapshot.
//!
//! The document has the shape
//!
//! ```text
//! { "timestamp": "2024-05-01T12:00:00Z", "duration": 42,
//!   "gps": {"lat": .., "lon": .., "acc": ..} | null,
//!   "ble": [{"address", "timestamp", "rssi", "connectable", "phys",
//!            "txPower", "serviceUuids", "advertisedName"}],
//!   "wifi": [{"ssid", "bssid", "rssi", "freq", "capabilities" | null}] }
//! ```

use crate::frame::{Phy, ResolvedAdvertisement};
use crate::side_channel::{GpsFix, WifiNetwork};
use crate::snapshot::Snapshot;
use chrono::SecondsFormat;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct SnapshotDocument<'a> {
    timestamp: String,
    duration: u64,
    gps: Option<&'a GpsFix>,
    ble: Vec<BleEntry<'a>>,
    wifi: Vec<WifiEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BleEntry<'a> {
    address: &'a str,
    timestamp: i64,
    rssi: i32,
    connectable: bool,
    phys: PhysEntry,
    tx_power: Option<i32>,
    service_uuids: &'a [String],
    advertised_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PhysEntry {
    primary: Phy,
    secondary: Option<Phy>,
}

#[derive(Debug, Serialize)]
struct WifiEntry<'a> {
    ssid: &'a str,
    bssid: &'a str,
    rssi: i32,
    freq: u32,
    capabilities: Option<&'a str>,
}

impl<'a> From<&'a ResolvedAdvertisement> for BleEntry<'a> {
    fn from(record: &'a ResolvedAdvertisement) -> Self {
        let frame = &record.frame;
        Self {
            address: &frame.address,
            timestamp: frame.timestamp_nanos,
            rssi: frame.rssi,
            connectable: frame.connectable,
            phys: PhysEntry {
                primary: frame.phy.primary,
                secondary: frame.phy.secondary,
            },
            tx_power: frame.tx_power,
            service_uuids: &frame.service_uuids,
            advertised_name: frame.advertised_name.as_deref(),
        }
    }
}

impl<'a> From<&'a WifiNetwork> for WifiEntry<'a> {
    fn from(network: &'a WifiNetwork) -> Self {
        Self {
            ssid: network.ssid.as_deref().unwrap_or_default(),
            bssid: &network.bssid,
            rssi: network.rssi_dbm,
            freq: network.freq_mhz,
            capabilities: network.capabilities.as_deref(),
        }
    }
}

fn document(snapshot: &Snapshot) -> SnapshotDocument<'_> {
    SnapshotDocument {
        timestamp: snapshot
            .taken_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        duration: snapshot.elapsed_secs,
        gps: snapshot.gps.as_ref(),
        ble: snapshot.ble.iter().map(BleEntry::from).collect(),
        wifi: snapshot.wifi.iter().map(WifiEntry::from).collect(),
    }
}

/// Serialize a snapshot to a JSON value.
pub fn to_value(snapshot: &Snapshot) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(document(snapshot))
}

/// Write a snapshot as pretty-printed JSON followed by a newline.
///
/// The writer is flushed before returning so buffered write errors surface
/// here instead of being lost when it is dropped.
pub fn write_snapshot<W: Write>(snapshot: &Snapshot, mut writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut writer, &document(snapshot))?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    writer.flush().map_err(serde_json::Error::io)
}
