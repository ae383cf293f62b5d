//! `beaconwatch` library.
//!
//! Turns a stream of BLE advertisement frames into a live, distance-sorted
//! list of nearby devices. Frames are enriched from an identifier registry
//! ([`registry`]) and an address prefix table ([`oui`]), grouped per device
//! in a rolling time window ([`window`]) and projected into rows with a
//! rough distance estimate ([`proximity`]). A [`session::Session`] ties the
//! pipeline together.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, logging setup
//! and process exit codes. The run loop lives in [`crate::app`] where it can
//! be tested deterministically with an injected frame source and output
//! stream.

pub mod app;
pub mod event;
pub mod frame;
pub mod mac_address;
pub mod manufacturer;
pub mod oui;
pub mod output;
pub mod proximity;
pub mod registry;
pub mod resolve;
pub mod session;
pub mod side_channel;
pub mod snapshot;
pub mod source;
pub mod throttle;
pub mod vendor;
pub mod window;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use event::CaptureEvent;
pub use frame::{AdvertisementFrame, Phy, PhyInfo, ResolvedAdvertisement};
pub use mac_address::MacAddress;
pub use manufacturer::ManufacturerInfo;
pub use oui::OuiTable;
pub use output::RowFormatter;
pub use output::line::LineFormatter;
pub use proximity::ProximityEstimator;
pub use registry::{IdentifierRegistry, RegistryCell, RegistrySources};
pub use resolve::Resolver;
pub use session::Session;
pub use side_channel::{GpsFix, WifiNetwork};
pub use snapshot::Snapshot;
pub use source::{Backend, FrameSource, SourceError};
pub use throttle::{Throttle, parse_duration};
pub use vendor::VendorLabel;
pub use window::{DeviceRow, RollingWindow};
