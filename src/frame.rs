//! Advertisement frame data structures.

use crate::manufacturer::ManufacturerInfo;
use crate::vendor::VendorLabel;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Physical layer an advertisement was received on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phy {
    #[default]
    #[serde(rename = "le_1m")]
    Le1M,
    #[serde(rename = "le_2m")]
    Le2M,
    #[serde(rename = "le_coded")]
    LeCoded,
}

/// Primary and (for extended advertising) secondary PHY of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhyInfo {
    pub primary: Phy,
    #[serde(default)]
    pub secondary: Option<Phy>,
}

/// One observed BLE advertisement, as produced by a capture backend.
///
/// Timestamps are monotonic nanoseconds on the capturing host's clock. They
/// are only meaningful relative to other frames from the same producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementFrame {
    /// Device address, e.g. "AA:BB:CC:DD:EE:FF". May be blank.
    #[serde(default)]
    pub address: String,
    /// Capture time in monotonic nanoseconds
    pub timestamp_nanos: i64,
    /// Received signal strength in dBm
    pub rssi: i32,
    #[serde(default)]
    pub connectable: bool,
    #[serde(default)]
    pub phy: PhyInfo,
    /// Advertised TX power in dBm
    #[serde(default)]
    pub tx_power: Option<i32>,
    /// Service UUIDs in advertised order, 16-bit or 128-bit string form
    #[serde(default)]
    pub service_uuids: Vec<String>,
    /// Manufacturer specific data keyed by company identifier, in advertised order
    #[serde(default)]
    pub manufacturer_data: IndexMap<u16, Vec<u8>>,
    #[serde(default)]
    pub advertised_name: Option<String>,
}

impl AdvertisementFrame {
    /// Company identifier of the first manufacturer data entry, if any.
    pub fn first_company_id(&self) -> Option<u16> {
        self.manufacturer_data.keys().next().copied()
    }
}

/// A frame enriched with registry and vendor lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAdvertisement {
    pub frame: AdvertisementFrame,
    /// Best manufacturer data entry, if the frame carried any
    pub manufacturer: Option<ManufacturerInfo>,
    /// Known names for the frame's service UUIDs
    pub service_names: Vec<String>,
    pub vendor: VendorLabel,
}

impl ResolvedAdvertisement {
    /// Wrap a frame without any resolved identifiers.
    pub fn unresolved(frame: AdvertisementFrame) -> Self {
        Self {
            frame,
            manufacturer: None,
            service_names: Vec::new(),
            vendor: VendorLabel::Unknown,
        }
    }

    #[inline]
    pub fn timestamp_nanos(&self) -> i64 {
        self.frame.timestamp_nanos
    }
}
