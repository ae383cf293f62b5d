//! Vendor label shown for a device.

use crate::manufacturer::ManufacturerInfo;
use crate::oui::OuiTable;
use std::fmt;

/// The vendor displayed for a device, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VendorLabel {
    /// Company name resolved from manufacturer specific data
    Manufacturer(String),
    /// Vendor of the address prefix
    Oui(String),
    #[default]
    Unknown,
}

impl VendorLabel {
    /// Decide the label for one frame.
    ///
    /// A resolved manufacturer name always wins. Without one, the first three
    /// octets of `address` are looked up in `oui`; blank vendor names count
    /// as no match.
    pub fn decide(manufacturer: Option<&ManufacturerInfo>, address: &str, oui: &OuiTable) -> Self {
        if let Some(name) = manufacturer.and_then(|m| m.company_name.as_deref()) {
            return VendorLabel::Manufacturer(name.to_string());
        }
        match oui.lookup(address) {
            Some(vendor) if !vendor.trim().is_empty() => VendorLabel::Oui(vendor.to_string()),
            _ => VendorLabel::Unknown,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            VendorLabel::Manufacturer(name) | VendorLabel::Oui(name) => Some(name),
            VendorLabel::Unknown => None,
        }
    }

    /// `"manufacturer"`, `"oui"`, or `None` when unknown.
    pub fn source(&self) -> Option<&'static str> {
        match self {
            VendorLabel::Manufacturer(_) => Some("manufacturer"),
            VendorLabel::Oui(_) => Some("oui"),
            VendorLabel::Unknown => None,
        }
    }
}

impl fmt::Display for VendorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => f.write_str("unknown"),
        }
    }
}
