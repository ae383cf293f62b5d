use crate::frame::{AdvertisementFrame, ResolvedAdvertisement};

/// A stable device address for unit tests.
pub const TEST_ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

/// Whole seconds as capture nanoseconds.
pub fn secs(s: i64) -> i64 {
    s * 1_000_000_000
}

/// Build a frame with no optional data and an RSSI of -60 dBm.
///
/// Tests can override just the fields they care about.
pub fn base_frame(address: &str, timestamp_nanos: i64) -> AdvertisementFrame {
    AdvertisementFrame {
        address: address.to_string(),
        timestamp_nanos,
        rssi: -60,
        ..AdvertisementFrame::default()
    }
}

/// An unresolved record with the given signal strength.
pub fn resolved(address: &str, timestamp_nanos: i64, rssi: i32) -> ResolvedAdvertisement {
    let mut frame = base_frame(address, timestamp_nanos);
    frame.rssi = rssi;
    ResolvedAdvertisement::unresolved(frame)
}
