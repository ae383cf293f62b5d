//! Frame enrichment: manufacturer, service and vendor resolution.

use crate::frame::{AdvertisementFrame, ResolvedAdvertisement};
use crate::manufacturer;
use crate::oui::OuiTable;
use crate::registry::IdentifierRegistry;
use crate::vendor::VendorLabel;
use std::sync::Arc;

/// Turns raw frames into [`ResolvedAdvertisement`]s.
///
/// Cheap to clone; the registry and OUI table are shared.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<IdentifierRegistry>,
    oui: Arc<OuiTable>,
}

impl Resolver {
    pub fn new(registry: Arc<IdentifierRegistry>, oui: Arc<OuiTable>) -> Self {
        Self { registry, oui }
    }

    /// Resolver using the built-in OUI table.
    pub fn with_builtin_oui(registry: Arc<IdentifierRegistry>) -> Self {
        Self::new(registry, Arc::new(OuiTable::builtin().clone()))
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    pub fn resolve(&self, frame: AdvertisementFrame) -> ResolvedAdvertisement {
        let manufacturer = manufacturer::resolve(
            frame
                .manufacturer_data
                .iter()
                .map(|(id, payload)| (*id, payload.as_slice())),
            |id| self.registry.company_name(id).map(str::to_owned),
        );

        let service_names = frame
            .service_uuids
            .iter()
            .filter_map(|uuid| self.registry.service_name(uuid))
            .map(str::to_owned)
            .collect();

        let vendor = VendorLabel::decide(manufacturer.as_ref(), &frame.address, &self.oui);

        ResolvedAdvertisement {
            frame,
            manufacturer,
            service_names,
            vendor,
        }
    }
}
