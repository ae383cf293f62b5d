//! BlueZ D-Bus backend.
//!
//! Uses the `bluer` crate to run an LE discovery session on the default
//! adapter. Every device property change triggers a fresh read of the
//! device's advertisement data, which is turned into one
//! [`AdvertisementFrame`]. Requires the `bluetoothd` daemon to be running.

use super::{CaptureClock, EVENT_CHANNEL_BUFFER_SIZE, SourceError};
use crate::event::CaptureEvent;
use crate::frame::AdvertisementFrame;
use crate::mac_address::MacAddress;
use bluer::{Adapter, AdapterEvent, Address, DiscoveryFilter, DiscoveryTransport, Session};
use futures::StreamExt;
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

impl From<bluer::Error> for SourceError {
    fn from(err: bluer::Error) -> Self {
        SourceError::Bluetooth(err.to_string())
    }
}

/// Start LE discovery and stream frames until the receiver is dropped.
pub async fn start_capture() -> Result<mpsc::Receiver<CaptureEvent>, SourceError> {
    let session = Session::new().await?;
    let adapter = session.default_adapter().await?;
    adapter.set_powered(true).await?;
    adapter
        .set_discovery_filter(DiscoveryFilter {
            transport: DiscoveryTransport::Le,
            duplicate_data: true,
            ..Default::default()
        })
        .await?;

    let events = adapter.discover_devices_with_changes().await?;
    info!(adapter = adapter.name(), "BLE discovery started");

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);
    let clock = CaptureClock::new();

    // The task owns all Bluetooth state so discovery lives as long as it does
    tokio::spawn(async move {
        let _session = session;
        let mut events = Box::pin(events);

        while let Some(event) = events.next().await {
            let AdapterEvent::DeviceAdded(address) = event else {
                continue;
            };
            match read_frame(&adapter, address, &clock).await {
                Ok(Some(frame)) => {
                    if tx.send(CaptureEvent::Advertisement(frame)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(%address, "skipping device: {e}"),
            }
        }
        debug!("BLE discovery stopped");
    });

    Ok(rx)
}

/// Read the current advertisement data of a device.
///
/// Returns `None` for cached devices that have no live RSSI.
async fn read_frame(
    adapter: &Adapter,
    address: Address,
    clock: &CaptureClock,
) -> Result<Option<AdvertisementFrame>, SourceError> {
    let device = adapter.device(address)?;
    let Some(rssi) = device.rssi().await? else {
        trace!(%address, "no RSSI, ignoring cached device");
        return Ok(None);
    };
    let timestamp_nanos = clock.now_nanos();

    let mut service_uuids: Vec<String> = device
        .uuids()
        .await?
        .unwrap_or_default()
        .into_iter()
        .map(|uuid| uuid.to_string())
        .collect();
    service_uuids.sort();

    Ok(Some(AdvertisementFrame {
        address: MacAddress::from(address).to_string(),
        timestamp_nanos,
        rssi: i32::from(rssi),
        tx_power: device.tx_power().await?.map(i32::from),
        service_uuids,
        manufacturer_data: ordered_manufacturer_data(
            device.manufacturer_data().await?.unwrap_or_default(),
        ),
        advertised_name: device.name().await?,
        ..AdvertisementFrame::default()
    }))
}

/// BlueZ reports manufacturer data unordered; order entries by company id
/// so the resolver's first-entry tie-break is stable.
fn ordered_manufacturer_data(data: HashMap<u16, Vec<u8>>) -> IndexMap<u16, Vec<u8>> {
    let mut ordered: IndexMap<u16, Vec<u8>> = data.into_iter().collect();
    ordered.sort_keys();
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_to_mac_address() {
        let addr = Address([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let mac: MacAddress = addr.into();
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_manufacturer_data_ordered_by_company() {
        let data = HashMap::from([
            (0x0499, vec![5]),
            (0x004C, vec![2, 21]),
            (0x0059, vec![1]),
        ]);
        let ordered = ordered_manufacturer_data(data);
        let ids: Vec<u16> = ordered.keys().copied().collect();
        assert_eq!(ids, vec![0x004C, 0x0059, 0x0499]);
    }

    #[test]
    fn test_bluetooth_error_conversion() {
        let err = SourceError::Bluetooth("org.bluez.Error.NotReady".into());
        assert_eq!(err.to_string(), "Bluetooth error: org.bluez.Error.NotReady");
    }
}
